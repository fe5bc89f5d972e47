//! GeoLayer - layer registry and rendering synchronization for web-GIS views
//!
//! This library keeps an in-memory catalog of logical map layers consistent
//! with a stateful rendering engine and a set of asynchronous backend
//! operations: feature/tile serving, table imports, service publication, and
//! server-side geoprocessing (buffer, clip, erase).
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a facade scoped to
//! one active map view:
//!
//! ```ignore
//! use geolayer::canvas::HeadlessCanvas;
//! use geolayer::config::EndpointConfig;
//! use geolayer::service::MapViewService;
//!
//! let service = MapViewService::new(EndpointConfig::default(), HeadlessCanvas::new())?;
//!
//! // Fetch, style, and display a published vector layer
//! service.add_vector_layer("parks").await?;
//! ```

pub mod canvas;
pub mod client;
pub mod config;
pub mod geoprocessing;
pub mod logging;
pub mod registry;
pub mod service;
pub mod style;
pub mod sync;

/// Version of the GeoLayer library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
