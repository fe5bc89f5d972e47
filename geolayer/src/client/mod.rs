//! Remote operation client for the catalog API and the map server.
//!
//! Every backend interaction (table listing, imports, service publication,
//! feature/tile access, and the geoprocessing computations) goes through
//! [`GeoApiClient`]. The transport is abstracted behind [`AsyncHttpClient`]
//! so the rest of the crate never touches reqwest directly.

mod error;
mod geojson;
mod http;
mod operations;

pub use error::ClientError;
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use http::{AsyncHttpClient, AsyncReqwestClient, FilePayload};
#[cfg(test)]
pub(crate) use http::tests::ScriptedHttpClient;
pub use operations::{BufferUnit, GeoApiClient, ImportFormat};
