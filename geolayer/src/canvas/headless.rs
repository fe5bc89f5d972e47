//! In-memory rendering canvas.
//!
//! Maintains the same observable state a live engine binding would
//! (sources, layers in draw order, layout visibility, paint properties) and
//! enforces the same failure modes. Used by the CLI session and by tests.

use std::collections::HashMap;

use tracing::trace;

use super::{CanvasError, LayerSpec, MapCanvas, RenderLayerKind};
use crate::client::FeatureCollection;
use crate::style::PaintValue;

#[derive(Debug, Clone)]
enum SourceData {
    RasterTiles(String),
    Features(FeatureCollection),
}

#[derive(Debug, Clone)]
struct LayerRecord {
    id: String,
    kind: RenderLayerKind,
    source: String,
    visible: bool,
    paint: HashMap<String, PaintValue>,
}

/// An in-memory [`MapCanvas`] implementation.
#[derive(Debug, Default)]
pub struct HeadlessCanvas {
    sources: HashMap<String, SourceData>,
    /// Layers in draw order: later entries draw on top
    layers: Vec<LayerRecord>,
}

impl HeadlessCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Number of registered layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Layer ids in draw order (bottom first).
    pub fn draw_order(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.id.clone()).collect()
    }

    /// The current value of a layer's paint property, if set.
    pub fn paint_value(&self, id: &str, property: &str) -> Option<PaintValue> {
        self.layers
            .iter()
            .find(|l| l.id == id)
            .and_then(|l| l.paint.get(property).copied())
    }

    /// The layout visibility of a layer.
    pub fn is_visible(&self, id: &str) -> Option<bool> {
        self.layers.iter().find(|l| l.id == id).map(|l| l.visible)
    }

    /// The tile URL template of a raster source, if present.
    pub fn raster_tile_url(&self, id: &str) -> Option<&str> {
        match self.sources.get(id) {
            Some(SourceData::RasterTiles(url)) => Some(url),
            _ => None,
        }
    }

    fn layer_mut(&mut self, id: &str) -> Result<&mut LayerRecord, CanvasError> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| CanvasError::MissingLayer(id.to_string()))
    }
}

impl MapCanvas for HeadlessCanvas {
    fn add_raster_source(&mut self, id: &str, tile_url: &str) -> Result<(), CanvasError> {
        if self.sources.contains_key(id) {
            return Err(CanvasError::DuplicateSource(id.to_string()));
        }
        trace!(id, "raster source added");
        self.sources
            .insert(id.to_string(), SourceData::RasterTiles(tile_url.to_string()));
        Ok(())
    }

    fn add_feature_source(
        &mut self,
        id: &str,
        data: FeatureCollection,
    ) -> Result<(), CanvasError> {
        if self.sources.contains_key(id) {
            return Err(CanvasError::DuplicateSource(id.to_string()));
        }
        trace!(id, features = data.features.len(), "feature source added");
        self.sources
            .insert(id.to_string(), SourceData::Features(data));
        Ok(())
    }

    fn add_layer(&mut self, spec: LayerSpec) -> Result<(), CanvasError> {
        if self.layers.iter().any(|l| l.id == spec.id) {
            return Err(CanvasError::DuplicateLayer(spec.id));
        }
        if !self.sources.contains_key(&spec.source) {
            return Err(CanvasError::MissingSource(spec.source));
        }
        trace!(id = %spec.id, kind = %spec.kind, "layer added");
        self.layers.push(LayerRecord {
            id: spec.id,
            kind: spec.kind,
            source: spec.source,
            visible: true,
            paint: spec
                .paint
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        });
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), CanvasError> {
        let before = self.layers.len();
        self.layers.retain(|l| l.id != id);
        if self.layers.len() == before {
            return Err(CanvasError::MissingLayer(id.to_string()));
        }
        trace!(id, "layer removed");
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), CanvasError> {
        if let Some(layer) = self.layers.iter().find(|l| l.source == id) {
            return Err(CanvasError::SourceInUse {
                source_id: id.to_string(),
                layer: layer.id.clone(),
            });
        }
        if self.sources.remove(id).is_none() {
            return Err(CanvasError::MissingSource(id.to_string()));
        }
        trace!(id, "source removed");
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id == id)
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn layer_kind(&self, id: &str) -> Option<RenderLayerKind> {
        self.layers.iter().find(|l| l.id == id).map(|l| l.kind)
    }

    fn set_visibility(&mut self, id: &str, visible: bool) -> Result<(), CanvasError> {
        self.layer_mut(id)?.visible = visible;
        Ok(())
    }

    fn set_paint_property(
        &mut self,
        id: &str,
        property: &str,
        value: PaintValue,
    ) -> Result<(), CanvasError> {
        self.layer_mut(id)?
            .paint
            .insert(property.to_string(), value);
        Ok(())
    }
}
