//! Geoprocessing orchestration.
//!
//! Buffer, clip, and erase are three-step sagas: compute the result table on
//! the server, publish it as a servable layer, then display it through the
//! synchronization engine. There is no rollback across steps: a computed
//! table whose publish fails stays server-side, and the error names it so
//! the publish can be retried.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::canvas::MapCanvas;
use crate::client::{AsyncHttpClient, BufferUnit, ClientError, GeoApiClient};
use crate::sync::{LayerSynchronizer, SyncError};

/// The spatial operations the orchestrator can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoOperation {
    Buffer,
    Clip,
    Erase,
}

impl GeoOperation {
    /// Suffix appended to the primary input's name when the user leaves the
    /// result name blank.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Buffer => "buffer",
            Self::Clip => "clip",
            Self::Erase => "erase",
        }
    }
}

impl fmt::Display for GeoOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// Errors from the compute → publish → display saga, tagged with the step
/// that failed.
#[derive(Debug, Error)]
pub enum GeoprocessError {
    /// Rejected client-side before any network call
    #[error("buffer distance {0} is invalid: must be greater than zero")]
    InvalidDistance(f64),

    #[error("{operation} computation failed: {source}")]
    Compute {
        operation: GeoOperation,
        #[source]
        source: ClientError,
    },

    /// The computed table '{layer}' remains on the server, unpublished
    #[error("publishing '{layer}' failed: {source}")]
    Publish {
        layer: String,
        #[source]
        source: ClientError,
    },

    #[error("displaying '{layer}' failed: {source}")]
    Display {
        layer: String,
        #[source]
        source: SyncError,
    },
}

/// Runs the compute → publish → display workflow for spatial operations.
pub struct GeoprocessingOrchestrator<C, E> {
    client: GeoApiClient<C>,
    sync: Arc<LayerSynchronizer<C, E>>,
}

impl<C, E> GeoprocessingOrchestrator<C, E>
where
    C: AsyncHttpClient,
    E: MapCanvas,
{
    pub fn new(client: GeoApiClient<C>, sync: Arc<LayerSynchronizer<C, E>>) -> Self {
        Self { client, sync }
    }

    /// Buffers every feature of `table` by `distance`, publishes the result
    /// and displays it. Returns the name of the displayed layer.
    pub async fn buffer(
        &self,
        table: &str,
        distance: f64,
        unit: BufferUnit,
        new_name: Option<&str>,
    ) -> Result<String, GeoprocessError> {
        if distance <= 0.0 {
            return Err(GeoprocessError::InvalidDistance(distance));
        }
        let result = result_name(new_name, table, GeoOperation::Buffer);

        self.client
            .create_buffer(table, distance, unit, &result)
            .await
            .map_err(|source| GeoprocessError::Compute {
                operation: GeoOperation::Buffer,
                source,
            })?;

        self.publish_and_display(GeoOperation::Buffer, result).await
    }

    /// Clips `input_layer` by `clip_layer`, publishes the result and
    /// displays it.
    pub async fn clip(
        &self,
        input_layer: &str,
        clip_layer: &str,
        new_name: Option<&str>,
    ) -> Result<String, GeoprocessError> {
        let result = result_name(new_name, input_layer, GeoOperation::Clip);

        self.client
            .create_clip(input_layer, clip_layer, &result)
            .await
            .map_err(|source| GeoprocessError::Compute {
                operation: GeoOperation::Clip,
                source,
            })?;

        self.publish_and_display(GeoOperation::Clip, result).await
    }

    /// Erases `erase_layer` from `target_layer`, publishes the result and
    /// displays it.
    pub async fn erase(
        &self,
        target_layer: &str,
        erase_layer: &str,
        new_name: Option<&str>,
    ) -> Result<String, GeoprocessError> {
        let result = result_name(new_name, target_layer, GeoOperation::Erase);

        self.client
            .create_erase(target_layer, erase_layer, &result)
            .await
            .map_err(|source| GeoprocessError::Compute {
                operation: GeoOperation::Erase,
                source,
            })?;

        self.publish_and_display(GeoOperation::Erase, result).await
    }

    async fn publish_and_display(
        &self,
        operation: GeoOperation,
        layer: String,
    ) -> Result<String, GeoprocessError> {
        if let Err(source) = self.client.publish_service(&layer).await {
            warn!(%operation, layer = %layer, error = %source, "publish failed, computed table left unpublished");
            return Err(GeoprocessError::Publish { layer, source });
        }

        self.sync
            .add_vector_layer(&layer)
            .await
            .map_err(|source| GeoprocessError::Display {
                layer: layer.clone(),
                source,
            })?;

        info!(%operation, layer = %layer, "geoprocessing result displayed");
        Ok(layer)
    }
}

/// Applies the default `<primary>_<suffix>` name when the requested one is
/// blank.
fn result_name(requested: Option<&str>, primary: &str, operation: GeoOperation) -> String {
    match requested.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{}_{}", primary, operation.suffix()),
    }
}
