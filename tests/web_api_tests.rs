//! Integration tests for the command API.
//!
//! These tests drive the router end to end against mock capabilities.

#![cfg(feature = "web")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use rs_curtains::config::{DevicesConfig, SlideCurtainConfig};
use rs_curtains::hal::{FixedNonce, MockPublisher, MockTransport};
use rs_curtains::registry::DeviceRegistry;
use rs_curtains::services::{build_router, ApiResponse, CommandResponse, WebServerConfig};

struct TestApp {
    router: axum::Router,
    bus: Arc<MockPublisher>,
    http: Arc<MockTransport>,
}

fn create_test_app() -> TestApp {
    let bus = Arc::new(MockPublisher::new());
    let http = Arc::new(MockTransport::digest_device("slide-device"));
    let devices = DevicesConfig::default()
        .with_aqara_shutter("kitchen", "zigbee2mqtt/kitchen-shutter/set")
        .with_slide_curtain("bedroom", SlideCurtainConfig::new("192.168.1.40", "a1b2c3d4e5f6"));
    let registry = DeviceRegistry::from_config(
        &devices,
        bus.clone(),
        http.clone(),
        Arc::new(FixedNonce::new("deadbeef")),
    );
    let router = build_router(Arc::new(registry), &WebServerConfig::default());
    TestApp { router, bus, http }
}

async fn send(app: &TestApp, method: &str, uri: &str) -> (StatusCode, ApiResponse<CommandResponse>) {
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

// ============================================================================
// Success
// ============================================================================

#[tokio::test]
async fn shutter_command_publishes_percentage() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/shutter/aqara?deviceId=kitchen&position=0.73").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json.success);
    assert_eq!(
        json.data.unwrap(),
        CommandResponse {
            device_id: "kitchen".into(),
            position: 0.73
        }
    );

    let published = app.bus.published_to("zigbee2mqtt/kitchen-shutter/set");
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].payload, br#"{"position":73}"#);
}

#[tokio::test]
async fn curtain_command_runs_digest_exchange() {
    let app = create_test_app();

    let (status, json) = send(&app, "POST", "/curtain/slide?deviceId=bedroom&position=0.25").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json.success);

    let requests = app.http.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].header("Authorization").is_none());
    assert_eq!(requests[1].body, br#"{"pos":0.25}"#);
    assert_eq!(requests[1].url, "http://192.168.1.40/rpc/Slide.SetPos");
}

#[tokio::test]
async fn get_and_post_are_equivalent() {
    let app = create_test_app();

    let (get, _) = send(&app, "GET", "/shutter/aqara?deviceId=kitchen&position=1").await;
    let (post, _) = send(&app, "POST", "/shutter/aqara?deviceId=kitchen&position=1").await;

    assert_eq!(get, StatusCode::OK);
    assert_eq!(post, StatusCode::OK);
    assert_eq!(app.bus.published().len(), 2);
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn missing_device_id_is_bad_request() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/shutter/aqara?position=0.5").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!json.success);
    assert_eq!(
        json.error.as_deref(),
        Some("No deviceId parameter present in request")
    );
    assert!(app.bus.published().is_empty());
}

#[tokio::test]
async fn missing_position_is_bad_request() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/curtain/slide?deviceId=bedroom").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json.error.as_deref(),
        Some("No position parameter present in request")
    );
    assert!(app.http.requests().is_empty());
}

#[tokio::test]
async fn unparseable_position_is_bad_request() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/curtain/slide?deviceId=bedroom&position=half").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json.error.as_deref(),
        Some("Unparseable position value (got 'half')")
    );

    let (status, _) = send(&app, "GET", "/curtain/slide?deviceId=bedroom&position=NaN").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.http.requests().is_empty());
}

#[tokio::test]
async fn empty_parameters_count_as_missing() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/shutter/aqara?deviceId=&position=0.5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json.error.as_deref(),
        Some("No deviceId parameter present in request")
    );

    let (status, json) = send(&app, "GET", "/shutter/aqara?deviceId=kitchen&position=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json.error.as_deref(),
        Some("No position parameter present in request")
    );

    assert!(app.bus.published().is_empty());
}

#[tokio::test]
async fn no_query_string_reports_device_id_first() {
    let app = create_test_app();

    let (status, json) = send(&app, "POST", "/shutter/aqara").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json.error.as_deref(),
        Some("No deviceId parameter present in request")
    );
}

// ============================================================================
// Lookup and device failures
// ============================================================================

#[tokio::test]
async fn unknown_device_is_not_found() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/shutter/aqara?deviceId=garage&position=0.5").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json.error.as_deref(), Some("Device 'garage' is unknown"));
}

#[tokio::test]
async fn identifiers_do_not_cross_classes() {
    let app = create_test_app();

    let (status, _) = send(&app, "GET", "/curtain/slide?deviceId=kitchen&position=0.5").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.bus.published().is_empty());
}

#[tokio::test]
async fn broker_failure_is_server_error() {
    let app = create_test_app();
    app.bus.set_failure(Some("not connected".into()));

    let (status, json) = send(&app, "GET", "/shutter/aqara?deviceId=kitchen&position=0.5").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json.error.as_deref(),
        Some("Unable to set the position of the shutter at this time")
    );
}

#[tokio::test]
async fn curtain_protocol_failure_is_server_error() {
    let bus = Arc::new(MockPublisher::new());
    // Device answers the probe with 200 instead of a challenge.
    let http = Arc::new(MockTransport::scripted(vec![Ok(
        rs_curtains::HttpReply::new(200),
    )]));
    let devices = DevicesConfig::default()
        .with_slide_curtain("bedroom", SlideCurtainConfig::new("192.168.1.40", "a1b2c3d4e5f6"));
    let registry = DeviceRegistry::from_config(
        &devices,
        bus.clone(),
        http.clone(),
        Arc::new(FixedNonce::new("deadbeef")),
    );
    let app = TestApp {
        router: build_router(Arc::new(registry), &WebServerConfig::default()),
        bus,
        http,
    };

    let (status, json) = send(&app, "GET", "/curtain/slide?deviceId=bedroom&position=0.5").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json.error.as_deref(),
        Some("Unable to set the position of the curtain at this time")
    );
    assert_eq!(app.http.requests().len(), 1);
}

#[tokio::test]
async fn unknown_path_falls_back_to_not_found() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/curtain/unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: ApiResponse<()> = serde_json::from_slice(&body).unwrap();
    assert_eq!(json.error.as_deref(), Some("Not found"));
}

#[tokio::test]
async fn cors_headers_when_permissive() {
    let router = build_router(Arc::new(DeviceRegistry::new()), &WebServerConfig::default().cors(true));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/shutter/aqara?deviceId=x&position=0")
                .header("Origin", "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}
