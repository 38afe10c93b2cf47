//! Station sources: the weather backend over HTTP, or a JSON file on disk.

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Something that can produce raw station objects.
#[async_trait]
pub trait StationSource: Send + Sync {
    /// Fetches the raw station list, or [`Error::DataUnavailable`].
    async fn fetch(&self) -> Result<Vec<Value>>;

    fn describe(&self) -> String;
}

pub struct HttpStationSource {
    client: Client,
    url: String,
}

impl HttpStationSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::data_unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl StationSource for HttpStationSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Vec<Value>> {
        debug!("Fetching stations");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::data_unavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::data_unavailable(format!("backend returned {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::data_unavailable(format!("malformed body: {}", e)))?;

        parse_station_payload(body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Reads a saved backend response from disk.
pub struct FileStationSource {
    path: PathBuf,
}

impl FileStationSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StationSource for FileStationSource {
    async fn fetch(&self) -> Result<Vec<Value>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::data_unavailable(format!("{:?}: {}", self.path, e)))?;
        let body: Value = serde_json::from_str(&content)
            .map_err(|e| Error::data_unavailable(format!("{:?}: {}", self.path, e)))?;
        parse_station_payload(body)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Accepts either a bare array or an object wrapping it in `data`.
pub fn parse_station_payload(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Array(stations) => Ok(stations),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(stations)) => Ok(stations),
            _ => Err(Error::data_unavailable("response object has no `data` array")),
        },
        _ => Err(Error::data_unavailable("response is not an array")),
    }
}

/// Fetches stations, degrading any failure to an empty list with one warning.
pub async fn fetch_stations(source: &dyn StationSource) -> Vec<Value> {
    match source.fetch().await {
        Ok(stations) => {
            info!(count = stations.len(), source = %source.describe(), "Fetched stations");
            stations
        }
        Err(e) => {
            warn!(error = %e, source = %source.describe(), "No station data, continuing with none");
            Vec::new()
        }
    }
}

/// Keeps stations whose trimmed `country` is in `allowed`. An empty list keeps everything.
pub fn filter_countries(stations: Vec<Value>, allowed: &[String]) -> Vec<Value> {
    if allowed.is_empty() {
        return stations;
    }

    let total = stations.len();
    let kept: Vec<Value> = stations
        .into_iter()
        .filter(|station| {
            station
                .get("country")
                .and_then(Value::as_str)
                .map(str::trim)
                .map_or(false, |country| allowed.iter().any(|a| a == country))
        })
        .collect();

    info!(kept = kept.len(), total, "Filtered stations by country");
    kept
}
