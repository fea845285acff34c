//! Digest exchange against a local HTTP server through the real transport.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rs_curtains::drivers::SlideCurtain;
use rs_curtains::hal::{FixedNonce, ReqwestTransport};
use rs_curtains::traits::PositionDevice;
use rs_curtains::{DeviceError, DigestError, ErrorKind};

const CHALLENGE: &str = r#"Digest qop="auth", realm="slide-device", nonce="0123456789abcdef""#;

fn golden_header(nc: &str, response: &str) -> String {
    format!(
        r#"Digest username="user", realm="slide-device", nonce="0123456789abcdef", uri="/rpc/Slide.SetPos", response="{}", qop="auth", nc="{}", cnonce="deadbeef""#,
        response, nc
    )
}

fn curtain_for(server: &MockServer) -> SlideCurtain {
    let transport = ReqwestTransport::new(Duration::from_secs(2), Duration::from_secs(1)).unwrap();
    let host = server.uri().trim_start_matches("http://").to_string();
    SlideCurtain::new(
        &host,
        "a1b2c3d4e5f6",
        Arc::new(transport),
        Arc::new(FixedNonce::new("deadbeef")),
    )
}

async fn mount_digest_device(server: &MockServer, accept: u16) {
    Mock::given(method("POST"))
        .and(path("/rpc/Slide.SetPos"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(accept))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rpc/Slide.SetPos"))
        .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", CHALLENGE))
        .mount(server)
        .await;
}

fn header(request: &wiremock::Request, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[tokio::test]
async fn authenticated_retry_carries_golden_header() {
    let server = MockServer::start().await;
    mount_digest_device(&server, 200).await;
    let curtain = curtain_for(&server);

    assert!(curtain.set_position(0.5).await);
    assert!(curtain.set_position(1.4).await);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);

    let probe = &requests[0];
    assert!(header(probe, "authorization").is_none());
    assert!(probe.body.is_empty());
    assert_eq!(header(probe, "content-type").as_deref(), Some("application/json"));

    let first = &requests[1];
    assert_eq!(
        header(first, "authorization").unwrap(),
        golden_header("00000001", "2f93ee89150af5662485ae511a4df52a")
    );
    assert_eq!(first.body, br#"{"pos":0.5}"#);
    assert_eq!(header(first, "content-type").as_deref(), Some("application/json"));

    let second = &requests[3];
    assert_eq!(
        header(second, "authorization").unwrap(),
        golden_header("00000002", "518db9cee7f4d34a1c71de4554e0d1aa")
    );
    assert_eq!(second.body, br#"{"pos":1.0}"#);
}

#[tokio::test]
async fn non_401_probe_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let curtain = curtain_for(&server);

    let err = curtain.try_set_position(0.5).await.unwrap_err();
    assert!(matches!(
        err,
        DeviceError::Digest(DigestError::UnexpectedStatus(200))
    ));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn challenge_without_nonce_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("WWW-Authenticate", r#"Digest qop="auth", realm="slide-device""#),
        )
        .mount(&server)
        .await;
    let curtain = curtain_for(&server);

    assert!(!curtain.set_position(0.5).await);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert_eq!(curtain.nonce_count().await, 0);
}

#[tokio::test]
async fn missing_challenge_header_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let curtain = curtain_for(&server);

    let err = curtain.try_set_position(0.5).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(matches!(err, DeviceError::Digest(DigestError::MissingChallenge)));
}

#[tokio::test]
async fn strict_mode_rejects_refused_retry() {
    let server = MockServer::start().await;
    mount_digest_device(&server, 403).await;

    let lenient = curtain_for(&server);
    assert!(lenient.set_position(0.5).await);

    let strict = curtain_for(&server).with_strict_status(true);
    let err = strict.try_set_position(0.5).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Rejected);
}

#[tokio::test]
async fn plain_mode_sends_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/Slide.SetPos"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let curtain = curtain_for(&server).with_auth(false);

    assert!(curtain.set_position(0.3).await);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(header(&requests[0], "authorization").is_none());
    assert_eq!(requests[0].body, br#"{"pos":0.3}"#);
}

#[tokio::test]
async fn unreachable_device_is_transport_error() {
    let transport = ReqwestTransport::new(Duration::from_millis(500), Duration::from_millis(200)).unwrap();
    let curtain = SlideCurtain::new(
        "127.0.0.1:9",
        "a1b2c3d4e5f6",
        Arc::new(transport),
        Arc::new(FixedNonce::new("deadbeef")),
    );

    let err = curtain.try_set_position(0.5).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}
