//! Endpoint configuration for the backend services.
//!
//! The catalog API, the map server, and the database schema / workspace /
//! datastore names are opaque strings supplied by deployment configuration.

use serde::{Deserialize, Serialize};

/// Addresses and namespace names for the backend services a map view talks
/// to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the catalog / geoprocessing API
    pub api_url: String,
    /// Base URL of the map server (WFS / WMS)
    pub geoserver_url: String,
    /// Database schema holding imported tables
    pub schema: String,
    /// Map server workspace name
    pub workspace: String,
    /// Map server datastore name
    pub datastore: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            geoserver_url: "http://localhost:8080/geoserver".to_string(),
            schema: "public".to_string(),
            workspace: "test_workspace".to_string(),
            datastore: "test_datastore".to_string(),
        }
    }
}

impl EndpointConfig {
    /// Creates a configuration with the two service base URLs; namespace
    /// names keep their defaults.
    pub fn new(api_url: impl Into<String>, geoserver_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            geoserver_url: geoserver_url.into(),
            ..Self::default()
        }
    }

    /// Sets the database schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Sets the map server workspace.
    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = workspace.into();
        self
    }

    /// Sets the map server datastore.
    pub fn with_datastore(mut self, datastore: impl Into<String>) -> Self {
        self.datastore = datastore.into();
        self
    }
}
