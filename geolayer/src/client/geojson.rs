//! Minimal GeoJSON feature model.
//!
//! Only the parts the synchronization engine inspects are typed: the
//! geometry type of each feature. Coordinates and properties stay opaque and
//! are handed to the rendering engine untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A GeoJSON FeatureCollection as returned by a WFS `GetFeature` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_type")]
    pub collection_type: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}

/// A single GeoJSON feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub properties: Value,
}

/// A GeoJSON geometry with opaque coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub geometry_type: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub coordinates: Value,
}

impl FeatureCollection {
    /// Returns the geometry type of the first feature, from which the whole
    /// collection's rendering category is derived.
    ///
    /// `None` means the collection is empty or the first feature has no
    /// geometry; callers treat that as an unsupported collection.
    pub fn first_geometry_type(&self) -> Option<&str> {
        self.features
            .first()
            .and_then(|f| f.geometry.as_ref())
            .map(|g| g.geometry_type.as_str())
    }
}
