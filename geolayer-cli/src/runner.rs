//! CLI runner for common setup.
//!
//! Encapsulates logging initialization and service creation so command
//! handlers share one construction path.

use geolayer::canvas::HeadlessCanvas;
use geolayer::client::AsyncReqwestClient;
use geolayer::config::EndpointConfig;
use geolayer::logging::{init_logging, LoggingGuard};
use geolayer::service::MapViewService;
use tracing::info;

use crate::error::CliError;

/// Runner that owns the logging guard and builds the map-view service.
pub struct CliRunner {
    /// Keeps logging active while the runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
}

impl CliRunner {
    /// Initializes logging. Log output goes to `logs/geolayer.log`; stdout
    /// stays reserved for command output.
    pub fn new(debug_mode: bool) -> Result<Self, CliError> {
        let logging_guard = init_logging("logs", "geolayer.log", false, debug_mode)
            .map_err(CliError::LoggingInit)?;

        info!(version = geolayer::VERSION, "geolayer CLI starting");

        Ok(Self { logging_guard })
    }

    /// Builds a map-view service over a headless canvas.
    pub fn service(
        &self,
        config: EndpointConfig,
    ) -> Result<MapViewService<AsyncReqwestClient, HeadlessCanvas>, CliError> {
        info!(
            api_url = %config.api_url,
            geoserver_url = %config.geoserver_url,
            schema = %config.schema,
            "creating map-view service"
        );
        Ok(MapViewService::new(config, HeadlessCanvas::new())?)
    }
}
