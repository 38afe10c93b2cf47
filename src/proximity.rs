//! Keeps stations that sit on a glacier or near its center of mass.
//!
//! Near-miss points are measured against the glacier centroid, not the
//! outline, so large irregular glaciers can reject stations close to an edge.

use crate::error::{Error, Result};
use crate::types::{FilteredCollection, Glacier, PointRecord};
use geo::intersects::Intersects;
use geo::HaversineDistance;
use rayon::prelude::*;
use tracing::info;

pub const DEFAULT_BUFFER_KM: f64 = 10.0;

/// Returns the records inside or on the outline of any glacier, or within
/// `buffer_km` of any glacier centroid, in input order.
///
/// Fails with [`Error::GeometryUnavailable`] when `glaciers` is empty so that
/// callers can tell "no geometry" apart from "no matches".
pub fn filter(
    points: &[PointRecord],
    glaciers: &[Glacier],
    buffer_km: f64,
) -> Result<FilteredCollection> {
    if glaciers.is_empty() {
        return Err(Error::geometry_unavailable(
            "cannot filter stations without glacier polygons",
        ));
    }

    let buffer_m = buffer_km * 1000.0;
    let records: Vec<PointRecord> = points
        .par_iter()
        .filter(|record| glaciers.iter().any(|glacier| is_near(record, glacier, buffer_m)))
        .cloned()
        .collect();

    info!(
        kept = records.len(),
        total = points.len(),
        buffer_km,
        "Filtered stations near glaciers"
    );

    Ok(FilteredCollection { records })
}

fn is_near(record: &PointRecord, glacier: &Glacier, buffer_m: f64) -> bool {
    glacier.geometry.intersects(&record.location)
        || record.location.haversine_distance(&glacier.centroid) <= buffer_m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GlacierAttributes, WeatherAttributes};
    use geo::{polygon, MultiPolygon, Point};

    fn record(id: &str, lon: f64, lat: f64) -> PointRecord {
        PointRecord {
            id: Some(id.to_string()),
            location: Point::new(lon, lat),
            name: id.to_string(),
            short_name: id.to_string(),
            country: "Norge".to_string(),
            weather: WeatherAttributes::default(),
        }
    }

    fn square(min: f64, max: f64) -> Glacier {
        let poly = polygon![
            (x: min, y: min),
            (x: min, y: max),
            (x: max, y: max),
            (x: max, y: min),
        ];
        Glacier::new(None, MultiPolygon::new(vec![poly]), GlacierAttributes::default()).unwrap()
    }

    fn ids(collection: &FilteredCollection) -> Vec<&str> {
        collection
            .iter()
            .filter_map(|r| r.id.as_deref())
            .collect()
    }

    #[test]
    fn test_inside_point_kept_regardless_of_buffer() {
        let glaciers = vec![square(0.0, 2.0)];
        // (1.9, 1.9) is ~141 km from the centroid but inside the outline
        let points = vec![record("inside", 1.9, 1.9)];
        let result = filter(&points, &glaciers, 0.0).unwrap();
        assert_eq!(ids(&result), vec!["inside"]);
    }

    #[test]
    fn test_containment_and_buffer() {
        // Centroid at (0.01, 0.01); (0.01, 0.08) is ~7.8 km north of it and outside
        let glaciers = vec![square(0.0, 0.02)];
        let points = vec![record("inside", 0.015, 0.015), record("near", 0.01, 0.08)];
        let result = filter(&points, &glaciers, 10.0).unwrap();
        assert_eq!(ids(&result), vec!["inside", "near"]);
    }

    #[test]
    fn test_point_on_outline_kept_beyond_buffer() {
        // (2.0, 1.0) lies on the east edge, ~111 km from the centroid
        let glaciers = vec![square(0.0, 2.0)];
        let points = vec![record("edge", 2.0, 1.0), record("corner", 0.0, 0.0)];
        let result = filter(&points, &glaciers, 10.0).unwrap();
        assert_eq!(ids(&result), vec!["edge", "corner"]);
    }

    #[test]
    fn test_point_in_hole_excluded() {
        let ring = polygon!(
            exterior: [
                (x: 0.0, y: 0.0),
                (x: 0.0, y: 2.0),
                (x: 2.0, y: 2.0),
                (x: 2.0, y: 0.0),
            ],
            interiors: [[
                (x: 1.4, y: 1.4),
                (x: 1.4, y: 1.8),
                (x: 1.8, y: 1.8),
                (x: 1.8, y: 1.4),
            ]],
        );
        let glaciers =
            vec![Glacier::new(None, MultiPolygon::new(vec![ring]), GlacierAttributes::default()).unwrap()];
        let points = vec![record("hole", 1.6, 1.6), record("ice", 0.3, 0.3)];
        let result = filter(&points, &glaciers, 1.0).unwrap();
        assert_eq!(ids(&result), vec!["ice"]);
    }

    #[test]
    fn test_far_point_excluded() {
        let glaciers = vec![square(0.0, 2.0)];
        let points = vec![record("far", 10.0, 10.0)];
        let result = filter(&points, &glaciers, 1.0).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_buffer_threshold() {
        let glaciers = vec![square(0.0, 0.02)];
        let near = record("edge", 0.01, 0.08);
        let exact_km = near.location.haversine_distance(&glaciers[0].centroid) / 1000.0;

        assert_eq!(filter(&[near.clone()], &glaciers, exact_km * 1.001).unwrap().len(), 1);
        assert!(filter(&[near], &glaciers, exact_km * 0.999).unwrap().is_empty());
    }

    #[test]
    fn test_zero_glaciers_is_an_error() {
        let points = vec![record("a", 1.0, 1.0)];
        let err = filter(&points, &[], 10.0).unwrap_err();
        assert!(matches!(err, Error::GeometryUnavailable { .. }));
    }

    #[test]
    fn test_any_glacier_matches() {
        let glaciers = vec![square(0.0, 1.0), square(20.0, 21.0)];
        let points = vec![
            record("first", 0.5, 0.5),
            record("none", 10.0, 10.0),
            record("second", 20.5, 20.5),
        ];
        let result = filter(&points, &glaciers, 5.0).unwrap();
        assert_eq!(ids(&result), vec!["first", "second"]);
    }

    #[test]
    fn test_subset_idempotent_and_deterministic() {
        let glaciers = vec![square(0.0, 0.02), square(5.0, 5.5)];
        let points: Vec<PointRecord> = (0..200)
            .map(|i| {
                let f = i as f64 * 0.03;
                record(&format!("p{}", i), f, f * 0.9)
            })
            .collect();

        let once = filter(&points, &glaciers, 10.0).unwrap();
        assert!(once.len() <= points.len());
        assert!(once.iter().all(|r| points.contains(r)));

        let twice = filter(&once.records, &glaciers, 10.0).unwrap();
        assert_eq!(once, twice);

        let again = filter(&points, &glaciers, 10.0).unwrap();
        assert_eq!(once, again);
    }

    #[test]
    fn test_empty_points() {
        let result = filter(&[], &[square(0.0, 1.0)], 10.0).unwrap();
        assert!(result.is_empty());
    }
}
