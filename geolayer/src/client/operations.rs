//! Typed operations against the catalog API and the map server.
//!
//! `GeoApiClient` owns the endpoint configuration and turns each backend
//! operation into a single request/response pair. It is generic over
//! [`AsyncHttpClient`] so tests can script the transport.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ClientError;
use super::geojson::FeatureCollection;
use super::http::{AsyncHttpClient, FilePayload};
use crate::config::EndpointConfig;

/// Supported upload formats for table imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    GeoJson,
    Shapefile,
    FlatGeobuf,
}

impl ImportFormat {
    /// The path segment selecting the backend import route.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::GeoJson => "import_geojson",
            Self::Shapefile => "import_shapefile",
            Self::FlatGeobuf => "import_flatgeobuf",
        }
    }
}

/// Distance unit accepted by the buffer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUnit {
    Meters,
    Kilometers,
}

impl BufferUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meters => "meters",
            Self::Kilometers => "kilometers",
        }
    }
}

#[derive(Debug, Deserialize)]
struct TablesResponse {
    tables: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct BufferRequest<'a> {
    schema_name: &'a str,
    table_name: &'a str,
    distance: f64,
    unit: &'a str,
    new_table_name: &'a str,
}

#[derive(Debug, Serialize)]
struct ClipRequest<'a> {
    input_layer: &'a str,
    clip_layer: &'a str,
    new_layer_name: &'a str,
}

#[derive(Debug, Serialize)]
struct EraseRequest<'a> {
    target_layer: &'a str,
    erase_layer: &'a str,
    new_layer_name: &'a str,
}

/// Client for every backend operation a map view performs.
#[derive(Clone)]
pub struct GeoApiClient<C> {
    http: C,
    config: EndpointConfig,
}

impl<C: AsyncHttpClient> GeoApiClient<C> {
    /// Creates a client over the given transport and endpoint configuration.
    pub fn new(http: C, config: EndpointConfig) -> Self {
        Self { http, config }
    }

    /// The endpoint configuration this client was built with.
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Lists the tables present in the configured schema.
    pub async fn list_tables(&self) -> Result<Vec<String>, ClientError> {
        let url = format!("{}/tables/{}", self.config.api_url, self.config.schema);
        let body = self.http.get(&url).await?;
        let parsed: TablesResponse = serde_json::from_slice(&body)
            .map_err(|e| ClientError::InvalidResponse(format!("table list: {}", e)))?;
        Ok(parsed.tables)
    }

    /// Drops a table from the configured schema.
    pub async fn delete_table(&self, name: &str) -> Result<(), ClientError> {
        let url = format!(
            "{}/table/{}/{}",
            self.config.api_url, self.config.schema, name
        );
        self.http.delete(&url).await?;
        debug!(table = name, "table deleted");
        Ok(())
    }

    /// Uploads a file into a new table.
    ///
    /// Import alone does not make the data visible: the table must still be
    /// published as a service before the map server will serve it.
    pub async fn import_file(
        &self,
        table: &str,
        format: ImportFormat,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ClientError> {
        let url = format!(
            "{}/{}/{}/{}",
            self.config.api_url,
            format.path_segment(),
            self.config.schema,
            table
        );
        let payload = FilePayload {
            field: "file".to_string(),
            file_name: file_name.to_string(),
            bytes,
        };
        let body = self.http.post_file(&url, payload).await?;
        Ok(ack_message(&body, "import completed"))
    }

    /// Publishes a table as a servable layer on the map server.
    pub async fn publish_service(&self, table: &str) -> Result<String, ClientError> {
        let url = format!(
            "{}/publish_service/?workspace_name={}&datastore_name={}&table_name={}",
            self.config.api_url,
            encode_component(&self.config.workspace),
            encode_component(&self.config.datastore),
            encode_component(table),
        );
        let body = self.http.post_empty(&url).await?;
        debug!(table, "service published");
        Ok(ack_message(&body, "service published"))
    }

    /// Fetches the features of a published vector layer via WFS.
    pub async fn fetch_features(&self, layer: &str) -> Result<FeatureCollection, ClientError> {
        let url = format!(
            "{}/ows?service=WFS&version=1.0.0&request=GetFeature&typeName={}:{}&outputFormat=application/json",
            self.config.geoserver_url, self.config.workspace, layer
        );
        let body = self.http.get(&url).await?;
        serde_json::from_slice(&body)
            .map_err(|e| ClientError::InvalidResponse(format!("feature collection: {}", e)))
    }

    /// Builds the tiled WMS URL template for a raster layer.
    ///
    /// The `{bbox-epsg-3857}` placeholder is substituted per tile by the
    /// rendering engine, not by this client.
    pub fn raster_tile_url(&self, layer: &str) -> String {
        format!(
            "{}/{}/wms?service=WMS&request=GetMap&layers={}&styles=&format=image/png&transparent=true&version=1.1.1&width=256&height=256&srs=EPSG:3857&bbox={{bbox-epsg-3857}}",
            self.config.geoserver_url, self.config.workspace, layer
        )
    }

    /// Computes a buffer around every feature of `table`, storing the result
    /// in `new_table`.
    pub async fn create_buffer(
        &self,
        table: &str,
        distance: f64,
        unit: BufferUnit,
        new_table: &str,
    ) -> Result<(), ClientError> {
        let url = format!("{}/create_buffer", self.config.api_url);
        let request = BufferRequest {
            schema_name: &self.config.schema,
            table_name: table,
            distance,
            unit: unit.as_str(),
            new_table_name: new_table,
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| ClientError::InvalidResponse(format!("buffer request: {}", e)))?;
        self.http.post_json(&url, &body).await?;
        debug!(table, new_table, distance, unit = unit.as_str(), "buffer computed");
        Ok(())
    }

    /// Clips `input_layer` by `clip_layer` into `new_layer`.
    pub async fn create_clip(
        &self,
        input_layer: &str,
        clip_layer: &str,
        new_layer: &str,
    ) -> Result<(), ClientError> {
        let url = format!("{}/create_clip", self.config.api_url);
        let request = ClipRequest {
            input_layer,
            clip_layer,
            new_layer_name: new_layer,
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| ClientError::InvalidResponse(format!("clip request: {}", e)))?;
        self.http.post_json(&url, &body).await?;
        debug!(input_layer, clip_layer, new_layer, "clip computed");
        Ok(())
    }

    /// Erases `erase_layer` from `target_layer` into `new_layer`.
    pub async fn create_erase(
        &self,
        target_layer: &str,
        erase_layer: &str,
        new_layer: &str,
    ) -> Result<(), ClientError> {
        let url = format!("{}/create_erase", self.config.api_url);
        let request = EraseRequest {
            target_layer,
            erase_layer,
            new_layer_name: new_layer,
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| ClientError::InvalidResponse(format!("erase request: {}", e)))?;
        self.http.post_json(&url, &body).await?;
        debug!(target_layer, erase_layer, new_layer, "erase computed");
        Ok(())
    }
}

/// Extracts the server-provided ack message, falling back to a fixed one.
fn ack_message(body: &[u8], fallback: &str) -> String {
    serde_json::from_slice::<AckResponse>(body)
        .ok()
        .and_then(|a| a.message)
        .unwrap_or_else(|| fallback.to_string())
}

/// Percent-encodes a value for use in a query string.
///
/// Schema, workspace, and table names are plain identifiers in practice;
/// only the reserved characters that would break the query string are
/// escaped.
fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
