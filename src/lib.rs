//! Weather stations on and around glaciers.
//!
//! Stations are fetched from a weather backend, converted into validated
//! point records, and kept only when they lie inside a glacier outline or
//! within a buffer distance of a glacier's center of mass.

pub mod config;
pub mod convert;
pub mod error;
pub mod glaciers;
pub mod processing;
pub mod proximity;
pub mod server;
pub mod stations;
pub mod types;

pub use error::{Error, Result};
pub use proximity::filter;
