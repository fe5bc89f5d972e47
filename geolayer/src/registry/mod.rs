//! The layer registry: the authoritative catalog of logical layers.
//!
//! The registry owns layer existence, ordering, and the user-visible
//! visibility/opacity/color attributes. The rendering engine's sources and
//! layers are a derived projection of this state; the synchronization engine
//! keeps the two consistent.
//!
//! Mutation policy is deliberately asymmetric: `remove` is idempotent, while
//! the attribute setters are silent no-ops when the target is absent. Both
//! cases arise from benign races between user actions and asynchronous
//! removal, and neither should surface as an error.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::style::{GeometryCategory, Rgb};

/// How a logical layer is sourced and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Tiled imagery served by the map server (WMS)
    RasterService,
    /// Feature data fetched and styled per geometry category (WFS)
    VectorFeatureSet,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RasterService => "raster",
            Self::VectorFeatureSet => "vector",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a logical layer.
///
/// `Pending` entries reserve a name while an asynchronous add is in flight;
/// conflicting operations against a `Pending` or `Removing` entry are
/// rejected instead of racing the in-flight work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerStatus {
    Pending,
    Active,
    Removing,
}

impl LayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Removing => "removing",
        }
    }
}

impl fmt::Display for LayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named, user-visible map layer tracked by the registry.
///
/// The name doubles as the rendering-engine source id, layer id, and the
/// backend table/service name, and is unique within the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLayer {
    pub name: String,
    pub kind: LayerKind,
    /// Set only for vector layers, derived once from the first fetched
    /// feature.
    pub geometry: Option<GeometryCategory>,
    pub status: LayerStatus,
    pub visible: bool,
    pub opacity: f64,
    /// Unset means the resolver's default for the geometry category applies.
    pub color: Option<Rgb>,
}

impl LogicalLayer {
    /// Creates an active raster layer entry with default attributes.
    pub fn raster(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: LayerKind::RasterService,
            geometry: None,
            status: LayerStatus::Active,
            visible: true,
            opacity: crate::style::DEFAULT_OPACITY,
            color: None,
        }
    }

    /// Creates an active vector layer entry with default attributes.
    pub fn vector(name: impl Into<String>, geometry: GeometryCategory) -> Self {
        Self {
            name: name.into(),
            kind: LayerKind::VectorFeatureSet,
            geometry: Some(geometry),
            status: LayerStatus::Active,
            visible: true,
            opacity: crate::style::DEFAULT_OPACITY,
            color: None,
        }
    }

    /// Creates a pending reservation for an in-flight vector add.
    pub fn pending_vector(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: LayerKind::VectorFeatureSet,
            geometry: None,
            status: LayerStatus::Pending,
            visible: true,
            opacity: crate::style::DEFAULT_OPACITY,
            color: None,
        }
    }
}

/// Error returned when an add would violate name uniqueness.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("layer '{0}' already exists")]
    DuplicateName(String),
}

/// Ordered, in-memory catalog of logical layers.
///
/// Newly added layers go to the head of the sequence: the list order is
/// most-recent-first and matches the rendering engine's top-to-bottom draw
/// order.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    layers: Vec<LogicalLayer>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Inserts a layer at the head of the sequence.
    ///
    /// Fails with [`RegistryError::DuplicateName`] when the name is already
    /// present, leaving prior state untouched.
    pub fn add(&mut self, layer: LogicalLayer) -> Result<(), RegistryError> {
        if self.contains(&layer.name) {
            return Err(RegistryError::DuplicateName(layer.name));
        }
        debug!(name = %layer.name, kind = %layer.kind, "layer registered");
        self.layers.insert(0, layer);
        Ok(())
    }

    /// Removes a layer and drops its attribute state.
    ///
    /// Removing an absent name is a no-op, not an error; returns whether an
    /// entry was actually removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.layers.len();
        self.layers.retain(|l| l.name != name);
        let removed = self.layers.len() != before;
        if removed {
            debug!(name, "layer removed from registry");
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&LogicalLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Read-only snapshot of the catalog in display order.
    pub fn list(&self) -> Vec<LogicalLayer> {
        self.layers.clone()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Updates a layer's status; no-op when absent.
    pub fn set_status(&mut self, name: &str, status: LayerStatus) {
        match self.entry(name) {
            Some(layer) => layer.status = status,
            None => debug!(name, "status update for absent layer ignored"),
        }
    }

    /// Records the geometry category derived for a vector layer.
    pub fn set_geometry(&mut self, name: &str, geometry: GeometryCategory) {
        match self.entry(name) {
            Some(layer) => layer.geometry = Some(geometry),
            None => debug!(name, "geometry update for absent layer ignored"),
        }
    }

    /// Sets layer visibility; silently ignored when the layer is absent.
    pub fn set_visibility(&mut self, name: &str, visible: bool) {
        match self.entry(name) {
            Some(layer) => layer.visible = visible,
            None => debug!(name, "visibility update for absent layer ignored"),
        }
    }

    /// Sets layer opacity, clamped to `[0, 1]`; silently ignored when the
    /// layer is absent.
    pub fn set_opacity(&mut self, name: &str, opacity: f64) {
        match self.entry(name) {
            Some(layer) => layer.opacity = opacity.clamp(0.0, 1.0),
            None => debug!(name, "opacity update for absent layer ignored"),
        }
    }

    /// Sets layer color; silently ignored when the layer is absent.
    pub fn set_color(&mut self, name: &str, color: Rgb) {
        match self.entry(name) {
            Some(layer) => layer.color = Some(color),
            None => debug!(name, "color update for absent layer ignored"),
        }
    }

    fn entry(&mut self, name: &str) -> Option<&mut LogicalLayer> {
        self.layers.iter_mut().find(|l| l.name == name)
    }
}
