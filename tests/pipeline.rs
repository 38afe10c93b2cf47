//! End-to-end station processing against on-disk fixtures.

use async_trait::async_trait;
use glacier_stations::glaciers::{glaciers_from_geojson, GlacierSet};
use glacier_stations::processing::{process_stations, ProcessOptions};
use glacier_stations::stations::{FileStationSource, StationSource};
use glacier_stations::{Error, Result};
use serde_json::{json, Value};
use std::io::Write;

struct FailingSource;

#[async_trait]
impl StationSource for FailingSource {
    async fn fetch(&self) -> Result<Vec<Value>> {
        Err(Error::data_unavailable("backend returned 502 Bad Gateway"))
    }

    fn describe(&self) -> String {
        "failing".to_string()
    }
}

fn glaciers() -> GlacierSet {
    let geojson = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "glac_name": "Test Glacier" },
            "geometry": { "type": "Polygon", "coordinates": [[[0.0, 0.0], [0.0, 0.02], [0.02, 0.02], [0.02, 0.0], [0.0, 0.0]]] }
        }]
    }"#;
    let glaciers = glaciers_from_geojson(geojson.parse().unwrap(), "glac_name").unwrap();
    GlacierSet::new(glaciers).unwrap()
}

fn stations_file() -> tempfile::NamedTempFile {
    let stations = json!({
        "data": [
            { "id": "inside", "country": "Norge", "geometry": { "coordinates": [0.01, 0.01] } },
            { "id": "near", "country": "Norge", "geometry": { "coordinates": [0.01, 0.08] } },
            { "id": "far", "country": "Norge", "geometry": { "coordinates": [10.0, 10.0] } },
            { "id": "swedish", "country": "Sverige", "geometry": { "coordinates": [0.011, 0.011] } },
            { "id": "broken", "country": "Norge", "geometry": { "coordinates": ["a", "b"] } },
            { "id": "short", "country": "Norge", "geometry": { "coordinates": [0.01] } }
        ]
    });
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(stations.to_string().as_bytes()).unwrap();
    file
}

fn ids(processed: &glacier_stations::processing::Processed) -> Vec<String> {
    processed
        .stations
        .iter()
        .filter_map(|r| r.id.clone())
        .collect()
}

#[tokio::test]
async fn test_pipeline_keeps_contained_and_buffered_stations() {
    let file = stations_file();
    let source = FileStationSource::new(file.path());
    let options = ProcessOptions {
        allowed_countries: vec![],
        buffer_km: 10.0,
    };

    let processed = process_stations(&source, &glaciers(), &options).await.unwrap();
    assert_eq!(ids(&processed), vec!["inside", "near", "swedish"]);
    assert_eq!(processed.conversion.accepted, 4);
    assert_eq!(processed.conversion.skipped, 2);
}

#[tokio::test]
async fn test_pipeline_country_allow_list() {
    let file = stations_file();
    let source = FileStationSource::new(file.path());
    let options = ProcessOptions {
        allowed_countries: vec!["Sverige".to_string()],
        buffer_km: 10.0,
    };

    let processed = process_stations(&source, &glaciers(), &options).await.unwrap();
    assert_eq!(ids(&processed), vec!["swedish"]);
}

#[tokio::test]
async fn test_pipeline_small_buffer() {
    let file = stations_file();
    let source = FileStationSource::new(file.path());
    let options = ProcessOptions {
        allowed_countries: vec![],
        buffer_km: 1.0,
    };

    let processed = process_stations(&source, &glaciers(), &options).await.unwrap();
    assert_eq!(ids(&processed), vec!["inside", "swedish"]);
}

#[tokio::test]
async fn test_unavailable_source_yields_empty_collection() {
    let options = ProcessOptions {
        allowed_countries: vec![],
        buffer_km: 10.0,
    };

    let processed = process_stations(&FailingSource, &glaciers(), &options).await.unwrap();
    assert!(processed.stations.is_empty());
    assert_eq!(processed.conversion.accepted, 0);
    assert_eq!(processed.conversion.skipped, 0);
}

#[test]
fn test_empty_glacier_set_rejected() {
    let err = GlacierSet::new(vec![]).err().unwrap();
    assert!(matches!(err, Error::GeometryUnavailable { .. }));
}
