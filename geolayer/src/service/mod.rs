//! Map-view service facade.
//!
//! Wires the HTTP client, operation client, synchronization engine, and
//! geoprocessing orchestrator into one object scoped to a single map view.
//! The facade is created when the view opens and torn down when it closes;
//! after teardown every layer operation is a benign no-op.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::canvas::MapCanvas;
use crate::client::{
    AsyncHttpClient, AsyncReqwestClient, BufferUnit, ClientError, GeoApiClient, ImportFormat,
};
use crate::config::EndpointConfig;
use crate::geoprocessing::{GeoprocessError, GeoprocessingOrchestrator};
use crate::registry::LogicalLayer;
use crate::style::{GeometryCategory, Rgb};
use crate::sync::{LayerSynchronizer, SyncError};

/// Errors raised while constructing the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to create HTTP client: {0}")]
    HttpClient(#[source] ClientError),
}

/// High-level facade for one active map view.
pub struct MapViewService<C, E> {
    client: GeoApiClient<C>,
    sync: Arc<LayerSynchronizer<C, E>>,
    geoprocessing: GeoprocessingOrchestrator<C, E>,
}

impl<E: MapCanvas> MapViewService<AsyncReqwestClient, E> {
    /// Creates a service over the real HTTP transport.
    pub fn new(config: EndpointConfig, canvas: E) -> Result<Self, ServiceError> {
        let http = AsyncReqwestClient::new().map_err(ServiceError::HttpClient)?;
        Ok(Self::with_client(http, config, canvas))
    }
}

impl<C, E> MapViewService<C, E>
where
    C: AsyncHttpClient + Clone,
    E: MapCanvas,
{
    /// Creates a service over an arbitrary transport. Used by tests to
    /// substitute scripted clients.
    pub fn with_client(http: C, config: EndpointConfig, canvas: E) -> Self {
        let client = GeoApiClient::new(http, config);
        let sync = Arc::new(LayerSynchronizer::new(client.clone(), canvas));
        let geoprocessing = GeoprocessingOrchestrator::new(client.clone(), Arc::clone(&sync));
        Self {
            client,
            sync,
            geoprocessing,
        }
    }

    /// The endpoint configuration this view talks to.
    pub fn config(&self) -> &EndpointConfig {
        self.client.config()
    }

    /// Tears the view down; subsequent layer operations become no-ops.
    pub fn teardown(&self) {
        self.sync.close();
    }

    pub fn is_torn_down(&self) -> bool {
        self.sync.is_closed()
    }

    /// Token fired on teardown, for external coordination.
    pub fn teardown_token(&self) -> CancellationToken {
        self.sync.closed_token()
    }

    /// Snapshot of the layer catalog, most recent first.
    pub fn layers(&self) -> Vec<LogicalLayer> {
        self.sync.layers()
    }

    pub async fn add_vector_layer(&self, name: &str) -> Result<GeometryCategory, SyncError> {
        self.sync.add_vector_layer(name).await
    }

    pub fn add_raster_layer(&self, name: &str) -> Result<(), SyncError> {
        self.sync.add_raster_layer(name)
    }

    pub fn remove_layer(&self, name: &str) -> Result<(), SyncError> {
        self.sync.remove_layer(name)
    }

    pub fn set_visibility(&self, name: &str, visible: bool) -> Result<(), SyncError> {
        self.sync.set_visibility(name, visible)
    }

    pub fn set_opacity(&self, name: &str, opacity: f64) -> Result<(), SyncError> {
        self.sync.set_opacity(name, opacity)
    }

    pub fn set_color(&self, name: &str, color: Rgb) -> Result<(), SyncError> {
        self.sync.set_color(name, color)
    }

    pub async fn buffer(
        &self,
        table: &str,
        distance: f64,
        unit: BufferUnit,
        new_name: Option<&str>,
    ) -> Result<String, GeoprocessError> {
        self.geoprocessing.buffer(table, distance, unit, new_name).await
    }

    pub async fn clip(
        &self,
        input_layer: &str,
        clip_layer: &str,
        new_name: Option<&str>,
    ) -> Result<String, GeoprocessError> {
        self.geoprocessing.clip(input_layer, clip_layer, new_name).await
    }

    pub async fn erase(
        &self,
        target_layer: &str,
        erase_layer: &str,
        new_name: Option<&str>,
    ) -> Result<String, GeoprocessError> {
        self.geoprocessing.erase(target_layer, erase_layer, new_name).await
    }

    pub async fn list_tables(&self) -> Result<Vec<String>, ClientError> {
        self.client.list_tables().await
    }

    pub async fn delete_table(&self, name: &str) -> Result<(), ClientError> {
        self.client.delete_table(name).await
    }

    /// Imports a file into a new table. The table still needs
    /// [`publish_service`](Self::publish_service) before it is servable.
    pub async fn import_file(
        &self,
        table: &str,
        format: ImportFormat,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ClientError> {
        self.client.import_file(table, format, file_name, bytes).await
    }

    pub async fn publish_service(&self, table: &str) -> Result<String, ClientError> {
        self.client.publish_service(table).await
    }

    /// Runs a read-only closure against the canvas.
    pub fn with_canvas<T>(&self, f: impl FnOnce(&E) -> T) -> T {
        self.sync.with_canvas(f)
    }
}
