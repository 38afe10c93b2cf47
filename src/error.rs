//! Error types for station retrieval and glacier loading.

use thiserror::Error;

/// Provider-level failures. Per-record problems are never errors; they are
/// counted in [`crate::convert::ConversionSummary`].
#[derive(Error, Debug)]
pub enum Error {
    /// Station source unreachable or returned something unusable.
    #[error("station data unavailable: {reason}")]
    DataUnavailable { reason: String },

    /// Glacier outlines missing, malformed, or empty.
    #[error("glacier geometry unavailable: {reason}")]
    GeometryUnavailable { reason: String },
}

impl Error {
    pub fn data_unavailable(reason: impl Into<String>) -> Self {
        Error::DataUnavailable {
            reason: reason.into(),
        }
    }

    pub fn geometry_unavailable(reason: impl Into<String>) -> Self {
        Error::GeometryUnavailable {
            reason: reason.into(),
        }
    }
}

/// Result alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;
