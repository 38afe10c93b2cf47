//! Conversion of raw station JSON into validated [`PointRecord`]s.

use crate::types::{PointRecord, WeatherAttributes};
use geo::Point;
use serde_json::Value;
use tracing::info;

pub const DEFAULT_NAME: &str = "Unnamed Station";
pub const DEFAULT_SHORT_NAME: &str = "Unknown";
pub const DEFAULT_COUNTRY: &str = "Norway";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub accepted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Conversion {
    pub records: Vec<PointRecord>,
    pub summary: ConversionSummary,
}

/// Converts raw station objects, dropping any without a `[lon, lat]` pair of
/// finite numbers. Never fails; malformed records only bump `skipped`.
pub fn convert_stations(stations: &[Value]) -> Conversion {
    let mut records = Vec::with_capacity(stations.len());
    let mut skipped = 0;

    for station in stations {
        match convert_station(station) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    let summary = ConversionSummary {
        accepted: records.len(),
        skipped,
    };
    info!(
        accepted = summary.accepted,
        skipped = summary.skipped,
        "Converted stations"
    );

    Conversion { records, summary }
}

fn convert_station(station: &Value) -> Option<PointRecord> {
    let location = coordinates(station)?;

    Some(PointRecord {
        id: station.get("id").and_then(id_string),
        location,
        name: text_or(station, &["name"], DEFAULT_NAME),
        short_name: text_or(station, &["shortName", "short_name"], DEFAULT_SHORT_NAME),
        country: text_or(station, &["country"], DEFAULT_COUNTRY),
        weather: WeatherAttributes {
            snow_depth: number(station, &["snow_depth", "snowDepth"]),
            wind_speed: number(station, &["wind_speed", "windSpeed"]),
            precipitation_type: text(station, &["precipitation_type", "precipitationType"]),
            reference_time: text(station, &["referenceTime", "reference_time"]),
        },
    })
}

fn coordinates(station: &Value) -> Option<Point<f64>> {
    let coords = station.get("geometry")?.get("coordinates")?.as_array()?;
    if coords.len() != 2 {
        return None;
    }
    let lon = coords[0].as_f64()?;
    let lat = coords[1].as_f64()?;
    if !lon.is_finite() || !lat.is_finite() {
        return None;
    }
    Some(Point::new(lon, lat))
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text(station: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| station.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn text_or(station: &Value, keys: &[&str], default: &str) -> String {
    text(station, keys).unwrap_or_else(|| default.to_string())
}

fn number(station: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| station.get(*key).and_then(Value::as_f64))
        .find(|v| v.is_finite())
}
