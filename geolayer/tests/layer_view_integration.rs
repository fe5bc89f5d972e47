//! Integration tests for the map-view service.
//!
//! These tests drive the full stack (service facade, synchronization
//! engine, registry, and headless canvas) over a scripted HTTP transport,
//! verifying:
//! - The end-to-end add → restyle → remove lifecycle
//! - No partial state after failed adds
//! - Name reservation while an add is in flight
//! - Teardown semantics for in-flight and subsequent operations

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use geolayer::canvas::{HeadlessCanvas, MapCanvas, RenderLayerKind};
use geolayer::client::{AsyncHttpClient, ClientError, FilePayload};
use geolayer::config::EndpointConfig;
use geolayer::registry::{LayerKind, LayerStatus};
use geolayer::service::MapViewService;
use geolayer::style::{GeometryCategory, PaintValue, Rgb};
use geolayer::sync::SyncError;
use tokio::sync::Notify;

// =============================================================================
// Test Helpers
// =============================================================================

/// Scripted transport with an optional gate that holds requests until the
/// test releases them.
#[derive(Clone)]
struct TestHttp {
    responses: Arc<Mutex<VecDeque<Result<Vec<u8>, ClientError>>>>,
    gate: Option<Arc<Notify>>,
}

impl TestHttp {
    fn new(responses: Vec<Result<Vec<u8>, ClientError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            gate: None,
        }
    }

    fn gated(responses: Vec<Result<Vec<u8>, ClientError>>) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let client = Self {
            responses: Arc::new(Mutex::new(responses.into())),
            gate: Some(Arc::clone(&gate)),
        };
        (client, gate)
    }

    async fn respond(&self) -> Result<Vec<u8>, ClientError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left")
    }
}

impl AsyncHttpClient for TestHttp {
    async fn get(&self, _url: &str) -> Result<Vec<u8>, ClientError> {
        self.respond().await
    }

    async fn post_json(&self, _url: &str, _json_body: &str) -> Result<Vec<u8>, ClientError> {
        self.respond().await
    }

    async fn post_empty(&self, _url: &str) -> Result<Vec<u8>, ClientError> {
        self.respond().await
    }

    async fn post_file(&self, _url: &str, _payload: FilePayload) -> Result<Vec<u8>, ClientError> {
        self.respond().await
    }

    async fn delete(&self, _url: &str) -> Result<Vec<u8>, ClientError> {
        self.respond().await
    }
}

fn feature_collection(geometry_type: &str) -> Vec<u8> {
    format!(
        r#"{{"type":"FeatureCollection","features":[{{"geometry":{{"type":"{}","coordinates":[]}}}}]}}"#,
        geometry_type
    )
    .into_bytes()
}

fn service(
    responses: Vec<Result<Vec<u8>, ClientError>>,
) -> MapViewService<TestHttp, HeadlessCanvas> {
    MapViewService::with_client(
        TestHttp::new(responses),
        EndpointConfig::default(),
        HeadlessCanvas::new(),
    )
}

// =============================================================================
// Integration Tests
// =============================================================================

#[tokio::test]
async fn test_end_to_end_vector_layer_lifecycle() {
    let service = service(vec![Ok(feature_collection("Polygon"))]);

    // Add: fetch, style, register
    let category = service.add_vector_layer("parks").await.unwrap();
    assert_eq!(category, GeometryCategory::Polygon);

    let layers = service.layers();
    assert_eq!(layers.len(), 1);
    let parks = &layers[0];
    assert_eq!(parks.name, "parks");
    assert_eq!(parks.kind, LayerKind::VectorFeatureSet);
    assert_eq!(parks.geometry, Some(GeometryCategory::Polygon));
    assert_eq!(parks.status, LayerStatus::Active);
    assert!(parks.visible);
    assert_eq!(parks.opacity, 0.5);

    // Restyle: the canvas fill-opacity and the registry both move to 0.2
    service.set_opacity("parks", 0.2).unwrap();
    service.with_canvas(|canvas| {
        assert_eq!(
            canvas.paint_value("parks", "fill-opacity"),
            Some(PaintValue::Number(0.2))
        );
    });
    assert_eq!(service.layers()[0].opacity, 0.2);

    // Remove: registry and canvas both forget the layer
    service.remove_layer("parks").unwrap();
    assert!(service.layers().is_empty());
    service.with_canvas(|canvas| {
        assert!(!canvas.has_layer("parks"));
        assert!(!canvas.has_source("parks"));
    });

    // Removing again succeeds as a no-op
    service.remove_layer("parks").unwrap();
}

#[tokio::test]
async fn test_failed_fetch_leaves_no_trace() {
    let service = service(vec![Err(ClientError::Network("refused".to_string()))]);

    let err = service.add_vector_layer("parks").await.unwrap_err();
    assert!(matches!(err, SyncError::Client(ClientError::Network(_))));

    assert!(service.layers().is_empty());
    service.with_canvas(|canvas| {
        assert_eq!(canvas.source_count(), 0);
        assert_eq!(canvas.layer_count(), 0);
    });
}

#[tokio::test]
async fn test_mixed_layer_stack_ordering() {
    let service = service(vec![
        Ok(feature_collection("LineString")),
        Ok(feature_collection("Point")),
    ]);

    service.add_raster_layer("elevation").unwrap();
    service.add_vector_layer("roads").await.unwrap();
    service.add_vector_layer("stations").await.unwrap();

    let names: Vec<String> = service.layers().into_iter().map(|l| l.name).collect();
    assert_eq!(names, vec!["stations", "roads", "elevation"]);

    service.with_canvas(|canvas| {
        // Draw order is bottom-up: most recently added draws on top
        assert_eq!(canvas.draw_order(), vec!["elevation", "roads", "stations"]);
        assert_eq!(canvas.layer_kind("roads"), Some(RenderLayerKind::Line));
        assert_eq!(canvas.layer_kind("stations"), Some(RenderLayerKind::Circle));
        assert_eq!(canvas.layer_kind("elevation"), Some(RenderLayerKind::Raster));
    });
}

#[tokio::test]
async fn test_line_and_circle_paint_dispatch() {
    let service = service(vec![
        Ok(feature_collection("MultiLineString")),
        Ok(feature_collection("MultiPoint")),
    ]);

    service.add_vector_layer("rivers").await.unwrap();
    service.add_vector_layer("wells").await.unwrap();

    service.set_opacity("rivers", 0.9).unwrap();
    service.set_color("wells", Rgb::new(0, 0, 0xFF)).unwrap();

    service.with_canvas(|canvas| {
        assert_eq!(
            canvas.paint_value("rivers", "line-opacity"),
            Some(PaintValue::Number(0.9))
        );
        assert_eq!(
            canvas.paint_value("wells", "circle-color"),
            Some(PaintValue::Color(Rgb::new(0, 0, 0xFF)))
        );
    });
}

#[tokio::test]
async fn test_in_flight_add_reserves_the_name() {
    let (http, gate) = TestHttp::gated(vec![Ok(feature_collection("Polygon"))]);
    let service = Arc::new(MapViewService::with_client(
        http,
        EndpointConfig::default(),
        HeadlessCanvas::new(),
    ));

    let background = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.add_vector_layer("parks").await })
    };

    // Let the background add reach its network await
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(service.layers()[0].status, LayerStatus::Pending);

    // A duplicate add and a remove are both rejected while in flight
    assert!(matches!(
        service.add_vector_layer("parks").await.unwrap_err(),
        SyncError::DuplicateName(_)
    ));
    assert!(matches!(
        service.remove_layer("parks").unwrap_err(),
        SyncError::PendingOperation(_)
    ));

    // Release the fetch; the add lands Active
    gate.notify_one();
    let category = background.await.unwrap().unwrap();
    assert_eq!(category, GeometryCategory::Polygon);
    assert_eq!(service.layers()[0].status, LayerStatus::Active);
}

#[tokio::test]
async fn test_teardown_mid_flight_abandons_the_add() {
    let (http, gate) = TestHttp::gated(vec![Ok(feature_collection("Polygon"))]);
    let service = Arc::new(MapViewService::with_client(
        http,
        EndpointConfig::default(),
        HeadlessCanvas::new(),
    ));

    let background = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.add_vector_layer("parks").await })
    };
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    service.teardown();
    gate.notify_one();

    let result = background.await.unwrap();
    assert!(matches!(result, Err(SyncError::ViewClosed)));

    // The completion did not mutate shared state
    assert!(service.layers().is_empty());
    service.with_canvas(|canvas| {
        assert_eq!(canvas.source_count(), 0);
        assert_eq!(canvas.layer_count(), 0);
    });
}

#[tokio::test]
async fn test_operations_after_teardown_are_benign() {
    let service = service(vec![Ok(feature_collection("Polygon"))]);
    service.add_vector_layer("parks").await.unwrap();

    service.teardown();
    assert!(service.is_torn_down());

    assert!(matches!(
        service.add_raster_layer("dem").unwrap_err(),
        SyncError::ViewClosed
    ));
    service.set_visibility("parks", false).unwrap();
    service.set_opacity("parks", 0.1).unwrap();
    service.remove_layer("parks").unwrap();

    // The view state is frozen as it was at teardown
    let layers = service.layers();
    assert_eq!(layers.len(), 1);
    assert!(layers[0].visible);
    assert_eq!(layers[0].opacity, 0.5);
}
