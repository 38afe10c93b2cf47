use geo::{Centroid, MultiPolygon, Point};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
use serde_json::json;

/// Optional weather readings attached to a station.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherAttributes {
    pub snow_depth: Option<f64>,
    pub wind_speed: Option<f64>,
    pub precipitation_type: Option<String>,
    pub reference_time: Option<String>,
}

/// A station with a validated (lon, lat) location.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub id: Option<String>,
    pub location: Point<f64>,
    pub name: String,
    pub short_name: String,
    pub country: String,
    pub weather: WeatherAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlacierAttributes {
    pub area_km2: Option<f64>,
    pub slope_deg: Option<f64>,
    pub elevation_m: Option<f64>,
}

/// A glacier outline with its center of mass computed once at load time.
#[derive(Debug, Clone)]
pub struct Glacier {
    pub name: Option<String>,
    pub geometry: MultiPolygon<f64>,
    pub centroid: Point<f64>,
    pub attributes: GlacierAttributes,
}

impl Glacier {
    /// Returns `None` for empty geometry, which has no centroid.
    pub fn new(
        name: Option<String>,
        geometry: MultiPolygon<f64>,
        attributes: GlacierAttributes,
    ) -> Option<Self> {
        let centroid = geometry.centroid()?;
        Some(Self {
            name,
            geometry,
            centroid,
            attributes,
        })
    }
}

/// Output of the proximity filter: a subset of the input records, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredCollection {
    pub records: Vec<PointRecord>,
}

impl FilteredCollection {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PointRecord> {
        self.records.iter()
    }

    pub fn to_geojson(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.records.iter().map(station_feature).collect(),
            foreign_members: None,
        }
    }
}

fn station_feature(record: &PointRecord) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), json!(record.id));
    properties.insert("name".to_string(), json!(record.name));
    properties.insert("shortName".to_string(), json!(record.short_name));
    properties.insert("country".to_string(), json!(record.country));
    properties.insert("snow_depth".to_string(), json!(record.weather.snow_depth));
    properties.insert("wind_speed".to_string(), json!(record.weather.wind_speed));
    properties.insert(
        "precipitation_type".to_string(),
        json!(record.weather.precipitation_type),
    );
    properties.insert(
        "referenceTime".to_string(),
        json!(record.weather.reference_time),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            record.location.x(),
            record.location.y(),
        ]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
