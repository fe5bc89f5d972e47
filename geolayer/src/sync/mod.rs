//! Rendering synchronization engine.
//!
//! Keeps the layer registry and the rendering canvas consistent through the
//! full lifecycle of a layer: `Absent → Pending → Active → Absent`. Every
//! registry+canvas mutation happens under one mutex scoped to the whole
//! engine, so a two-phase add (source, then layer) or remove (layer, then
//! source) is never interleaved with another layer's mutation. Network
//! fetches run with no lock held; the layer name is reserved with a
//! `Pending` registry entry for the duration, which closes the race between
//! an in-flight add and a concurrent remove or duplicate add.
//!
//! A failed add drops the reservation and leaves both the registry and the
//! canvas untouched; there is no error-retained state.

use std::sync::Mutex;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::canvas::{CanvasError, LayerSpec, MapCanvas, RenderLayerKind};
use crate::client::{AsyncHttpClient, ClientError, GeoApiClient};
use crate::registry::{LayerRegistry, LayerStatus, LogicalLayer, RegistryError};
use crate::style::{resolve_style, GeometryCategory, PaintValue, Rgb};

/// Errors surfaced by layer synchronization operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The name is already present in the registry or on the canvas
    #[error("layer '{0}' already exists")]
    DuplicateName(String),

    /// An asynchronous operation for this name is still in flight
    #[error("an operation for layer '{0}' is still in flight")]
    PendingOperation(String),

    /// The first feature's geometry type is outside the supported set
    #[error("layer '{layer}' has unsupported geometry type '{geometry_type}'")]
    UnsupportedGeometry { layer: String, geometry_type: String },

    /// The fetched collection has no feature to derive a geometry type from
    #[error("layer '{0}' returned no features to derive a geometry type from")]
    EmptyFeatureCollection(String),

    /// The map view has been torn down
    #[error("map view has been closed")]
    ViewClosed,

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("rendering engine error: {0}")]
    Canvas(#[from] CanvasError),
}

impl From<RegistryError> for SyncError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::DuplicateName(name) => Self::DuplicateName(name),
        }
    }
}

/// Registry and canvas behind the engine-wide mutex.
struct ViewState<E> {
    canvas: E,
    registry: LayerRegistry,
}

/// Orchestrates fetch, canvas registration, and registry bookkeeping for
/// one map view.
pub struct LayerSynchronizer<C, E> {
    client: GeoApiClient<C>,
    state: Mutex<ViewState<E>>,
    /// Fired on view teardown; async completions re-check it before
    /// mutating shared state.
    closed: CancellationToken,
}

impl<C: AsyncHttpClient, E: MapCanvas> LayerSynchronizer<C, E> {
    /// Creates a synchronizer over a live canvas.
    pub fn new(client: GeoApiClient<C>, canvas: E) -> Self {
        Self {
            client,
            state: Mutex::new(ViewState {
                canvas,
                registry: LayerRegistry::new(),
            }),
            closed: CancellationToken::new(),
        }
    }

    /// The token fired when the view is torn down.
    pub fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }

    /// Tears the view down. Subsequent mutations become benign no-ops and
    /// in-flight completions abandon their work.
    pub fn close(&self) {
        info!("map view closed");
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Snapshot of the registry in display order (most recent first).
    pub fn layers(&self) -> Vec<LogicalLayer> {
        self.state.lock().unwrap().registry.list()
    }

    /// Adds a tiled raster layer served by the map server.
    ///
    /// Fully synchronous: the tile URL is a template, no network round trip
    /// happens until the engine starts pulling tiles.
    pub fn add_raster_layer(&self, name: &str) -> Result<(), SyncError> {
        if self.is_closed() {
            return Err(SyncError::ViewClosed);
        }
        let tile_url = self.client.raster_tile_url(name);

        let mut state = self.state.lock().unwrap();
        Self::check_name_free(&state, name)?;

        state.canvas.add_raster_source(name, &tile_url)?;
        if let Err(e) = state.canvas.add_layer(LayerSpec {
            id: name.to_string(),
            kind: RenderLayerKind::Raster,
            source: name.to_string(),
            paint: Vec::new(),
        }) {
            // Undo the half-finished add so no orphan source leaks
            let _ = state.canvas.remove_source(name);
            return Err(e.into());
        }
        state.registry.add(LogicalLayer::raster(name))?;
        info!(name, "raster layer added");
        Ok(())
    }

    /// Adds a vector layer by fetching its features and deriving the
    /// rendering style from the first feature's geometry type.
    ///
    /// Returns the derived geometry category. Failure at any step leaves
    /// the name absent from both registry and canvas.
    pub async fn add_vector_layer(&self, name: &str) -> Result<GeometryCategory, SyncError> {
        if self.is_closed() {
            return Err(SyncError::ViewClosed);
        }

        // Reserve the name before going to the network
        {
            let mut state = self.state.lock().unwrap();
            Self::check_name_free(&state, name)?;
            state.registry.add(LogicalLayer::pending_vector(name))?;
        }

        let collection = match self.client.fetch_features(name).await {
            Ok(collection) => collection,
            Err(e) => {
                warn!(name, error = %e, "feature fetch failed, dropping reservation");
                self.drop_reservation(name);
                return Err(e.into());
            }
        };

        // The view may have been torn down while the fetch was in flight
        if self.is_closed() {
            self.drop_reservation(name);
            return Err(SyncError::ViewClosed);
        }

        let geometry_type = match collection.first_geometry_type() {
            Some(ty) => ty.to_string(),
            None => {
                self.drop_reservation(name);
                return Err(SyncError::EmptyFeatureCollection(name.to_string()));
            }
        };

        let style = match resolve_style(&geometry_type) {
            Some(style) => style,
            None => {
                self.drop_reservation(name);
                return Err(SyncError::UnsupportedGeometry {
                    layer: name.to_string(),
                    geometry_type,
                });
            }
        };

        let mut state = self.state.lock().unwrap();
        if let Err(e) = state.canvas.add_feature_source(name, collection) {
            state.registry.remove(name);
            return Err(e.into());
        }
        let spec = LayerSpec {
            id: name.to_string(),
            kind: match style.category {
                GeometryCategory::Polygon => RenderLayerKind::Fill,
                GeometryCategory::Line => RenderLayerKind::Line,
                GeometryCategory::Point => RenderLayerKind::Circle,
            },
            source: name.to_string(),
            paint: style.paint.properties(),
        };
        if let Err(e) = state.canvas.add_layer(spec) {
            let _ = state.canvas.remove_source(name);
            state.registry.remove(name);
            return Err(e.into());
        }
        state.registry.set_geometry(name, style.category);
        state.registry.set_status(name, LayerStatus::Active);
        info!(name, geometry = %style.category, "vector layer added");
        Ok(style.category)
    }

    /// Removes a layer from the canvas and the registry.
    ///
    /// Idempotent: removing an absent name succeeds as a no-op. Rejected
    /// while an add for the same name is still in flight.
    pub fn remove_layer(&self, name: &str) -> Result<(), SyncError> {
        if self.is_closed() {
            debug!(name, "remove on closed view ignored");
            return Ok(());
        }

        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.registry.get(name) {
            if entry.status == LayerStatus::Pending {
                return Err(SyncError::PendingOperation(name.to_string()));
            }
        }
        state.registry.set_status(name, LayerStatus::Removing);

        // Display layer must detach before its source, or the engine
        // rejects the removal for a dangling reference
        if state.canvas.has_layer(name) {
            state.canvas.remove_layer(name)?;
        }
        if state.canvas.has_source(name) {
            state.canvas.remove_source(name)?;
        }
        state.registry.remove(name);
        info!(name, "layer removed");
        Ok(())
    }

    /// Sets layout visibility, mirroring the result into the registry.
    ///
    /// A missing target is a benign no-op: the layer may already have been
    /// removed by a concurrent action.
    pub fn set_visibility(&self, name: &str, visible: bool) -> Result<(), SyncError> {
        if self.is_closed() {
            debug!(name, "visibility change on closed view ignored");
            return Ok(());
        }
        let mut state = self.state.lock().unwrap();
        if !state.canvas.has_layer(name) {
            debug!(name, "visibility change for absent layer ignored");
            return Ok(());
        }
        state.canvas.set_visibility(name, visible)?;
        state.registry.set_visibility(name, visible);
        Ok(())
    }

    /// Sets layer opacity via the paint property matching the canvas's
    /// declared layer kind.
    pub fn set_opacity(&self, name: &str, opacity: f64) -> Result<(), SyncError> {
        if self.is_closed() {
            debug!(name, "opacity change on closed view ignored");
            return Ok(());
        }
        let opacity = opacity.clamp(0.0, 1.0);
        let mut state = self.state.lock().unwrap();
        let Some(kind) = state.canvas.layer_kind(name) else {
            debug!(name, "opacity change for absent layer ignored");
            return Ok(());
        };
        let property = match kind {
            RenderLayerKind::Fill => "fill-opacity",
            RenderLayerKind::Line => "line-opacity",
            RenderLayerKind::Circle => "circle-opacity",
            other => {
                debug!(name, kind = %other, "opacity not supported for layer kind, ignored");
                return Ok(());
            }
        };
        state
            .canvas
            .set_paint_property(name, property, PaintValue::Number(opacity))?;
        state.registry.set_opacity(name, opacity);
        Ok(())
    }

    /// Sets layer color via the paint property matching the canvas's
    /// declared layer kind.
    pub fn set_color(&self, name: &str, color: Rgb) -> Result<(), SyncError> {
        if self.is_closed() {
            debug!(name, "color change on closed view ignored");
            return Ok(());
        }
        let mut state = self.state.lock().unwrap();
        let Some(kind) = state.canvas.layer_kind(name) else {
            debug!(name, "color change for absent layer ignored");
            return Ok(());
        };
        let property = match kind {
            RenderLayerKind::Fill => "fill-color",
            RenderLayerKind::Line => "line-color",
            RenderLayerKind::Circle => "circle-color",
            RenderLayerKind::Symbol => "text-color",
            other => {
                debug!(name, kind = %other, "color not supported for layer kind, ignored");
                return Ok(());
            }
        };
        state
            .canvas
            .set_paint_property(name, property, PaintValue::Color(color))?;
        state.registry.set_color(name, color);
        Ok(())
    }

    /// Runs a read-only closure against the canvas. Intended for state
    /// inspection by drivers and tests.
    pub fn with_canvas<T>(&self, f: impl FnOnce(&E) -> T) -> T {
        f(&self.state.lock().unwrap().canvas)
    }

    fn check_name_free(state: &ViewState<E>, name: &str) -> Result<(), SyncError> {
        if state.registry.contains(name)
            || state.canvas.has_layer(name)
            || state.canvas.has_source(name)
        {
            return Err(SyncError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    fn drop_reservation(&self, name: &str) {
        self.state.lock().unwrap().registry.remove(name);
    }
}
