//! Rendering-engine mutation surface.
//!
//! The map view consumes a small slice of the rendering engine: add/remove
//! source, add/remove layer, layout visibility, paint properties, and
//! layer-by-id queries. [`MapCanvas`] captures exactly that surface so the
//! synchronization engine can be driven against a real engine binding, the
//! in-memory [`HeadlessCanvas`], or a test double.
//!
//! The engine's layer "type" strings are mapped once at this boundary into
//! the closed [`RenderLayerKind`] set; everything above dispatches on the
//! variant, never on strings.

mod headless;

use std::fmt;

use thiserror::Error;

use crate::client::FeatureCollection;
use crate::style::PaintValue;

pub use headless::HeadlessCanvas;

/// Declared type of a rendering-engine layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderLayerKind {
    Fill,
    Line,
    Circle,
    Symbol,
    Raster,
    /// Any engine layer type outside the set this crate styles
    Other,
}

impl RenderLayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::Line => "line",
            Self::Circle => "circle",
            Self::Symbol => "symbol",
            Self::Raster => "raster",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for RenderLayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors surfaced by rendering-engine mutations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CanvasError {
    #[error("source '{0}' already exists")]
    DuplicateSource(String),

    #[error("layer '{0}' already exists")]
    DuplicateLayer(String),

    #[error("source '{0}' not found")]
    MissingSource(String),

    #[error("layer '{0}' not found")]
    MissingLayer(String),

    /// Removing a source while a layer still draws from it
    #[error("source '{source_id}' is still referenced by layer '{layer}'")]
    SourceInUse { source_id: String, layer: String },
}

/// Specification for a new display layer bound to a source.
#[derive(Debug, Clone)]
pub struct LayerSpec {
    /// Layer id; by convention identical to the source id
    pub id: String,
    pub kind: RenderLayerKind,
    /// Id of the source the layer draws from
    pub source: String,
    /// Initial paint properties
    pub paint: Vec<(&'static str, PaintValue)>,
}

/// The rendering engine's mutation interface, as consumed by the
/// synchronization engine.
///
/// A live instance exists once per map view. Implementations are expected to
/// mirror the real engine's failure modes: duplicate ids are rejected, and a
/// source cannot be removed while a layer still references it, which is why
/// removal always detaches the display layer first.
pub trait MapCanvas: Send {
    /// Registers a tiled raster source addressed by a templated URL.
    fn add_raster_source(&mut self, id: &str, tile_url: &str) -> Result<(), CanvasError>;

    /// Registers a feature (GeoJSON) source.
    fn add_feature_source(
        &mut self,
        id: &str,
        data: FeatureCollection,
    ) -> Result<(), CanvasError>;

    /// Adds a display layer bound to an existing source.
    fn add_layer(&mut self, spec: LayerSpec) -> Result<(), CanvasError>;

    /// Removes a display layer.
    fn remove_layer(&mut self, id: &str) -> Result<(), CanvasError>;

    /// Removes a source. Fails while any layer still references it.
    fn remove_source(&mut self, id: &str) -> Result<(), CanvasError>;

    fn has_layer(&self, id: &str) -> bool;

    fn has_source(&self, id: &str) -> bool;

    /// The declared kind of a layer, or `None` when absent.
    fn layer_kind(&self, id: &str) -> Option<RenderLayerKind>;

    /// Sets the layout visibility of a layer.
    fn set_visibility(&mut self, id: &str, visible: bool) -> Result<(), CanvasError>;

    /// Sets a single paint property of a layer.
    fn set_paint_property(
        &mut self,
        id: &str,
        property: &str,
        value: PaintValue,
    ) -> Result<(), CanvasError>;
}
