//! GeoJSON types for projected series and area geometry.
//!
//! Only the subset the renderers consume: points for time log records and
//! polygons for field boundaries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    /// Features in source order.
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Create a new empty FeatureCollection.
    pub fn new() -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features: Vec::new(),
        }
    }

    /// Add multiple features to the collection.
    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features.extend(features);
        self
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    pub geometry: Geometry,

    pub properties: FeatureProperties,
}

impl Feature {
    /// Create a new feature with a point geometry.
    pub fn point(lon: f64, lat: f64) -> Self {
        Self {
            type_: "Feature".to_string(),
            geometry: Geometry::point(lon, lat),
            properties: FeatureProperties::default(),
        }
    }

    /// Set the field values.
    pub fn with_values(mut self, values: BTreeMap<String, f64>) -> Self {
        self.properties.values = values;
        self
    }

    /// Tag the feature with the series it was projected from.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.properties.origin = Some(origin.into());
        self
    }
}

/// Feature properties: field values keyed by value key, plus the origin
/// series id on features of merged views.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureProperties {
    #[serde(
        rename = "originalTimeLogId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub origin: Option<String>,

    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

/// GeoJSON geometry types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    /// Coordinates as [longitude, latitude].
    Point { coordinates: [f64; 2] },

    /// Linear rings, exterior first.
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },

    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

impl Geometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinates: [lon, lat],
        }
    }

    /// Every coordinate of the geometry, in order.
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        match self {
            Geometry::Point { coordinates } => vec![*coordinates],
            Geometry::Polygon { coordinates } => coordinates.iter().flatten().copied().collect(),
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().copied().collect()
            }
        }
    }
}
