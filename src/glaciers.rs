//! Glacier outline loading (GeoJSON or shapefile) and point lookup.

use crate::error::{Error, Result};
use crate::types::{Glacier, GlacierAttributes};
use anyhow::{anyhow, Context};
use geo::bounding_rect::BoundingRect;
use geo::contains::Contains;
use geo::{MultiPolygon, Point};
use geojson::GeoJson;
use rstar::{RTree, RTreeObject, AABB};
use serde_json::Value;
use shapefile::dbase::FieldValue;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const AREA_FIELD: &str = "area_km2";
const SLOPE_FIELD: &str = "slope_deg";
const ELEVATION_FIELD: &str = "zmed_m";

struct GlacierIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for GlacierIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// Immutable, non-empty set of glaciers with a bounding-box index.
pub struct GlacierSet {
    glaciers: Vec<Glacier>,
    tree: RTree<GlacierIndex>,
}

impl GlacierSet {
    pub fn new(glaciers: Vec<Glacier>) -> Result<Self> {
        if glaciers.is_empty() {
            return Err(Error::geometry_unavailable("no glacier polygons loaded"));
        }

        let items: Vec<GlacierIndex> = glaciers
            .iter()
            .enumerate()
            .filter_map(|(index, glacier)| {
                let rect = glacier.geometry.bounding_rect()?;
                Some(GlacierIndex {
                    index,
                    aabb: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();

        Ok(Self {
            glaciers,
            tree: RTree::bulk_load(items),
        })
    }

    pub fn glaciers(&self) -> &[Glacier] {
        &self.glaciers
    }

    pub fn len(&self) -> usize {
        self.glaciers.len()
    }

    /// The glacier whose outline contains `(lon, lat)`, if any.
    pub fn glacier_at(&self, lon: f64, lat: f64) -> Option<&Glacier> {
        let point = Point::new(lon, lat);
        let envelope = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|candidate| self.glaciers.get(candidate.index))
            .find(|glacier| glacier.geometry.contains(&point))
    }
}

/// Loads glacier outlines, dispatching on the file extension.
pub fn load_glaciers(path: &Path, name_field: &str) -> Result<GlacierSet> {
    let glaciers = read_glaciers(path, name_field)
        .map_err(|e| Error::geometry_unavailable(format!("{:#}", e)))?;
    let set = GlacierSet::new(glaciers)?;
    info!(count = set.len(), path = ?path, "Loaded glaciers");
    Ok(set)
}

/// Runs [`load_glaciers`] on the blocking pool.
pub async fn load_glaciers_async(path: PathBuf, name_field: String) -> Result<GlacierSet> {
    tokio::task::spawn_blocking(move || load_glaciers(&path, &name_field))
        .await
        .map_err(|e| Error::geometry_unavailable(format!("glacier loader panicked: {}", e)))?
}

fn read_glaciers(path: &Path, name_field: &str) -> anyhow::Result<Vec<Glacier>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Glacier file has no extension: {:?}", path))?;

    match extension.as_str() {
        "shp" => load_shapefile(path, name_field),
        "json" | "geojson" => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
            let geojson = GeoJson::from_reader(BufReader::new(file))
                .context("Failed to parse glacier GeoJSON")?;
            glaciers_from_geojson(geojson, name_field)
        }
        _ => Err(anyhow!("Unsupported glacier format: {}", extension)),
    }
}

/// Extracts polygon and multipolygon features; anything else is skipped.
pub fn glaciers_from_geojson(geojson: GeoJson, name_field: &str) -> anyhow::Result<Vec<Glacier>> {
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("Glacier GeoJSON must be a FeatureCollection")),
    };

    let mut glaciers = Vec::new();
    let mut skipped = 0usize;

    for feature in collection.features {
        let properties = feature.properties.unwrap_or_default();

        let geometry = match feature.geometry {
            Some(geom) => {
                let converted: std::result::Result<geo::Geometry<f64>, _> = geom.value.try_into();
                match converted {
                    Ok(geo::Geometry::MultiPolygon(mp)) => mp,
                    Ok(geo::Geometry::Polygon(p)) => MultiPolygon::new(vec![p]),
                    _ => {
                        skipped += 1;
                        continue;
                    }
                }
            }
            None => {
                skipped += 1;
                continue;
            }
        };

        let name = properties
            .get(name_field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let attributes = GlacierAttributes {
            area_km2: properties.get(AREA_FIELD).and_then(Value::as_f64),
            slope_deg: properties.get(SLOPE_FIELD).and_then(Value::as_f64),
            elevation_m: properties.get(ELEVATION_FIELD).and_then(Value::as_f64),
        };

        match Glacier::new(name, geometry, attributes) {
            Some(glacier) => glaciers.push(glacier),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, "Skipped glacier features without usable polygon geometry");
    }

    Ok(glaciers)
}

fn load_shapefile(path: &Path, name_field: &str) -> anyhow::Result<Vec<Glacier>> {
    let mut reader = shapefile::Reader::from_path(path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", path))?;

    let mut glaciers = Vec::new();
    let mut skipped = 0usize;

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;

        let geometry: MultiPolygon<f64> = match shape {
            shapefile::Shape::Polygon(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygon: {:?}", e))?,
            shapefile::Shape::PolygonM(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygonM: {:?}", e))?,
            shapefile::Shape::PolygonZ(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygonZ: {:?}", e))?,
            _ => {
                skipped += 1;
                continue;
            }
        };

        let name = match record.get(name_field) {
            Some(FieldValue::Character(Some(s))) if !s.trim().is_empty() => {
                Some(s.trim().to_string())
            }
            _ => None,
        };

        let attributes = GlacierAttributes {
            area_km2: record.get(AREA_FIELD).and_then(field_number),
            slope_deg: record.get(SLOPE_FIELD).and_then(field_number),
            elevation_m: record.get(ELEVATION_FIELD).and_then(field_number),
        };

        match Glacier::new(name, geometry, attributes) {
            Some(glacier) => glaciers.push(glacier),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, "Skipped non-polygon or empty shapes");
    }

    Ok(glaciers)
}

fn field_number(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Numeric(Some(n)) => Some(*n),
        FieldValue::Float(Some(f)) => Some(*f as f64),
        FieldValue::Double(d) => Some(*d),
        FieldValue::Integer(i) => Some(*i as f64),
        _ => None,
    }
}
