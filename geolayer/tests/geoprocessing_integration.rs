//! Integration tests for the geoprocessing workflow.
//!
//! Each operation is a compute → publish → display saga with no rollback;
//! these tests verify step ordering, default result naming, and the state
//! left behind when each step fails.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use geolayer::canvas::{HeadlessCanvas, MapCanvas};
use geolayer::client::{AsyncHttpClient, BufferUnit, ClientError, FilePayload};
use geolayer::config::EndpointConfig;
use geolayer::geoprocessing::{GeoOperation, GeoprocessError};
use geolayer::registry::LayerStatus;
use geolayer::service::MapViewService;
use geolayer::style::GeometryCategory;

// =============================================================================
// Test Helpers
// =============================================================================

#[derive(Debug, Clone)]
struct Request {
    method: String,
    url: String,
    body: Option<String>,
}

/// Recording transport with scripted responses.
#[derive(Clone, Default)]
struct RecordingHttp {
    responses: Arc<Mutex<VecDeque<Result<Vec<u8>, ClientError>>>>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl RecordingHttp {
    fn new(responses: Vec<Result<Vec<u8>, ClientError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn record(&self, method: &str, url: &str, body: Option<String>) -> Result<Vec<u8>, ClientError> {
        self.requests.lock().unwrap().push(Request {
            method: method.to_string(),
            url: url.to_string(),
            body,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left")
    }

    fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

impl AsyncHttpClient for RecordingHttp {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        self.record("GET", url, None)
    }

    async fn post_json(&self, url: &str, json_body: &str) -> Result<Vec<u8>, ClientError> {
        self.record("POST", url, Some(json_body.to_string()))
    }

    async fn post_empty(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        self.record("POST", url, None)
    }

    async fn post_file(&self, url: &str, payload: FilePayload) -> Result<Vec<u8>, ClientError> {
        self.record("POST", url, Some(payload.file_name))
    }

    async fn delete(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        self.record("DELETE", url, None)
    }
}

fn polygon_collection() -> Vec<u8> {
    br#"{"type":"FeatureCollection","features":[{"geometry":{"type":"Polygon","coordinates":[]}}]}"#
        .to_vec()
}

fn service(http: RecordingHttp) -> MapViewService<RecordingHttp, HeadlessCanvas> {
    MapViewService::with_client(http, EndpointConfig::default(), HeadlessCanvas::new())
}

// =============================================================================
// Integration Tests
// =============================================================================

#[tokio::test]
async fn test_buffer_saga_end_to_end() {
    let http = RecordingHttp::new(vec![
        Ok(b"{}".to_vec()),                            // create_buffer
        Ok(br#"{"message": "published"}"#.to_vec()),   // publish_service
        Ok(polygon_collection()),                      // WFS fetch for display
    ]);
    let service = service(http.clone());

    let layer = service
        .buffer("roads", 100.0, BufferUnit::Meters, None)
        .await
        .unwrap();
    assert_eq!(layer, "roads_buffer");

    // The saga ran its three steps in order
    let requests = http.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].url.ends_with("/create_buffer"));
    let compute_body: serde_json::Value =
        serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(compute_body["new_table_name"], "roads_buffer");
    assert_eq!(compute_body["unit"], "meters");
    assert!(requests[1].url.contains("publish_service"));
    assert!(requests[2].url.contains("GetFeature"));

    // The result is displayed without a reload: registered and styled
    let layers = service.layers();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].name, "roads_buffer");
    assert_eq!(layers[0].status, LayerStatus::Active);
    assert_eq!(layers[0].geometry, Some(GeometryCategory::Polygon));
    service.with_canvas(|canvas| assert!(canvas.has_layer("roads_buffer")));
}

#[tokio::test]
async fn test_clip_uses_explicit_name_and_erase_defaults() {
    let http = RecordingHttp::new(vec![
        Ok(b"{}".to_vec()),
        Ok(b"{}".to_vec()),
        Ok(polygon_collection()),
        Ok(b"{}".to_vec()),
        Ok(b"{}".to_vec()),
        Ok(polygon_collection()),
    ]);
    let service = service(http.clone());

    let clipped = service
        .clip("parks", "district", Some("downtown_parks"))
        .await
        .unwrap();
    assert_eq!(clipped, "downtown_parks");

    let erased = service.erase("parks", "water", None).await.unwrap();
    assert_eq!(erased, "parks_erase");

    let requests = http.requests();
    let clip_body: serde_json::Value =
        serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(clip_body["input_layer"], "parks");
    assert_eq!(clip_body["clip_layer"], "district");
    assert_eq!(clip_body["new_layer_name"], "downtown_parks");

    let erase_body: serde_json::Value =
        serde_json::from_str(requests[3].body.as_deref().unwrap()).unwrap();
    assert_eq!(erase_body["target_layer"], "parks");
    assert_eq!(erase_body["erase_layer"], "water");
    assert_eq!(erase_body["new_layer_name"], "parks_erase");

    let names: Vec<String> = service.layers().into_iter().map(|l| l.name).collect();
    assert_eq!(names, vec!["parks_erase", "downtown_parks"]);
}

#[tokio::test]
async fn test_compute_failure_stops_the_saga() {
    let http = RecordingHttp::new(vec![Err(ClientError::Server {
        status: 400,
        message: "Unsupported unit".to_string(),
    })]);
    let service = service(http.clone());

    let err = service
        .buffer("roads", 10.0, BufferUnit::Kilometers, None)
        .await
        .unwrap_err();
    match err {
        GeoprocessError::Compute { operation, source } => {
            assert_eq!(operation, GeoOperation::Buffer);
            assert!(source.to_string().contains("Unsupported unit"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // Neither publish nor display was attempted
    assert_eq!(http.requests().len(), 1);
    assert!(service.layers().is_empty());
}

#[tokio::test]
async fn test_publish_failure_leaves_computed_table_behind() {
    let http = RecordingHttp::new(vec![
        Ok(b"{}".to_vec()),
        Err(ClientError::Server {
            status: 500,
            message: "datastore unavailable".to_string(),
        }),
    ]);
    let service = service(http.clone());

    let err = service.clip("parks", "district", None).await.unwrap_err();
    match err {
        GeoprocessError::Publish { layer, .. } => assert_eq!(layer, "parks_clip"),
        other => panic!("unexpected error: {:?}", other),
    }

    // Compute ran, display never did; nothing reached the view
    assert_eq!(http.requests().len(), 2);
    assert!(service.layers().is_empty());
    service.with_canvas(|canvas| assert_eq!(canvas.source_count(), 0));
}

#[tokio::test]
async fn test_display_failure_after_successful_publish() {
    let http = RecordingHttp::new(vec![
        Ok(b"{}".to_vec()),
        Ok(b"{}".to_vec()),
        Err(ClientError::Network("connection reset".to_string())),
    ]);
    let service = service(http.clone());

    let err = service
        .buffer("roads", 1.0, BufferUnit::Meters, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GeoprocessError::Display { .. }));

    // The layer was published but could not be displayed; the view holds no
    // partial state and the add can simply be retried
    assert!(service.layers().is_empty());
}

#[tokio::test]
async fn test_result_layer_name_collision_is_display_error() {
    let http = RecordingHttp::new(vec![
        Ok(polygon_collection()),  // initial add of "roads_buffer"
        Ok(b"{}".to_vec()),        // compute
        Ok(b"{}".to_vec()),        // publish
    ]);
    let service = service(http.clone());

    // A layer with the default result name is already displayed
    service.add_vector_layer("roads_buffer").await.unwrap();

    let err = service
        .buffer("roads", 100.0, BufferUnit::Meters, None)
        .await
        .unwrap_err();
    match err {
        GeoprocessError::Display { layer, .. } => assert_eq!(layer, "roads_buffer"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(service.layers().len(), 1);
}
