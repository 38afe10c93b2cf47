use crate::convert::{convert_stations, ConversionSummary};
use crate::error::Result;
use crate::glaciers::GlacierSet;
use crate::proximity;
use crate::stations::{fetch_stations, filter_countries, StationSource};
use crate::types::FilteredCollection;

#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub allowed_countries: Vec<String>,
    pub buffer_km: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Processed {
    pub stations: FilteredCollection,
    pub conversion: ConversionSummary,
}

/// Fetch, country filter, convert, proximity filter.
///
/// An unavailable station source yields an empty collection; only missing
/// glacier geometry is returned as an error.
pub async fn process_stations(
    source: &dyn StationSource,
    glaciers: &GlacierSet,
    options: &ProcessOptions,
) -> Result<Processed> {
    let raw = fetch_stations(source).await;
    let raw = filter_countries(raw, &options.allowed_countries);

    let conversion = convert_stations(&raw);
    let stations = proximity::filter(&conversion.records, glaciers.glaciers(), options.buffer_km)?;

    Ok(Processed {
        stations,
        conversion: conversion.summary,
    })
}
