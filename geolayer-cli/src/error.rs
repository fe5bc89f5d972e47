//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::io;
use std::process;

use geolayer::client::ClientError;
use geolayer::geoprocessing::GeoprocessError;
use geolayer::service::ServiceError;
use geolayer::sync::SyncError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(io::Error),
    /// Failed to create the map-view service
    ServiceCreation(ServiceError),
    /// A backend operation failed
    Backend(ClientError),
    /// A layer operation failed
    Layer(SyncError),
    /// A geoprocessing saga failed
    Geoprocessing(GeoprocessError),
    /// Failed to read an input file
    FileRead { path: String, error: io::Error },
    /// Invalid command-line input
    InvalidArgument(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Backend(ClientError::Network(_)) = self {
            eprintln!();
            eprintln!("Check that the catalog API and map server are reachable;");
            eprintln!("their addresses can be set with --api-url and --geoserver-url.");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::ServiceCreation(e) => write!(f, "Failed to create service: {}", e),
            CliError::Backend(e) => write!(f, "Backend operation failed: {}", e),
            CliError::Layer(e) => write!(f, "Layer operation failed: {}", e),
            CliError::Geoprocessing(e) => write!(f, "Geoprocessing failed: {}", e),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path, error)
            }
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::ServiceCreation(e) => Some(e),
            CliError::Backend(e) => Some(e),
            CliError::Layer(e) => Some(e),
            CliError::Geoprocessing(e) => Some(e),
            CliError::FileRead { error, .. } => Some(error),
            CliError::InvalidArgument(_) => None,
        }
    }
}

impl From<ClientError> for CliError {
    fn from(e: ClientError) -> Self {
        CliError::Backend(e)
    }
}

impl From<SyncError> for CliError {
    fn from(e: SyncError) -> Self {
        CliError::Layer(e)
    }
}

impl From<GeoprocessError> for CliError {
    fn from(e: GeoprocessError) -> Self {
        CliError::Geoprocessing(e)
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::ServiceCreation(e)
    }
}
