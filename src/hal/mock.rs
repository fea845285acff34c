//! Mock capabilities for testing without a broker or real devices.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockPublisher`] | [`MessagePublisher`] | Captures publishes, can simulate broker errors |
//! | [`MockTransport`] | [`HttpTransport`] | Scripted replies or a simulated digest device |
//! | [`FixedNonce`] | [`NonceSource`] | Always the same client nonce |
//! | [`SequenceNonce`] | [`NonceSource`] | `00000001`, `00000002`, ... |
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rs_curtains::drivers::AqaraShutter;
//! use rs_curtains::hal::MockPublisher;
//! use rs_curtains::traits::PositionDevice;
//!
//! # tokio_test_block(async {
//! let bus = Arc::new(MockPublisher::new());
//! let shutter = AqaraShutter::new(bus.clone(), "zigbee2mqtt/kitchen/set");
//!
//! assert!(shutter.set_position(0.73).await);
//! assert_eq!(bus.published()[0].payload, br#"{"position":73}"#);
//! # });
//! # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```
//!
//! [`MessagePublisher`]: crate::traits::MessagePublisher
//! [`HttpTransport`]: crate::traits::HttpTransport
//! [`NonceSource`]: crate::traits::NonceSource

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{PublishError, TransportError};
use crate::traits::{
    DeliveryQos, HttpReply, HttpRequest, HttpTransport, MessagePublisher, NonceSource,
};

// ============================================================================
// Message Bus Mock
// ============================================================================

/// A message captured by [`MockPublisher`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedMessage {
    /// Topic published to.
    pub topic: String,
    /// Requested delivery guarantee.
    pub qos: DeliveryQos,
    /// Retain flag.
    pub retain: bool,
    /// Raw payload.
    pub payload: Vec<u8>,
}

/// Mock message-bus publisher.
///
/// Records every accepted publish. Call [`set_failure`](Self::set_failure) to
/// make subsequent publishes fail like a disconnected broker.
#[derive(Debug, Default)]
pub struct MockPublisher {
    published: Mutex<Vec<PublishedMessage>>,
    failure: Mutex<Option<String>>,
}

impl MockPublisher {
    /// Creates a publisher that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a publisher that rejects everything with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        let publisher = Self::default();
        publisher.set_failure(Some(reason.into()));
        publisher
    }

    /// Set or clear the simulated failure.
    pub fn set_failure(&self, reason: Option<String>) {
        *lock(&self.failure) = reason;
    }

    /// All accepted messages, in order.
    pub fn published(&self) -> Vec<PublishedMessage> {
        lock(&self.published).clone()
    }

    /// Accepted messages for one topic.
    pub fn published_to(&self, topic: &str) -> Vec<PublishedMessage> {
        lock(&self.published)
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MessagePublisher for MockPublisher {
    async fn publish(
        &self,
        topic: &str,
        qos: DeliveryQos,
        retain: bool,
        payload: Vec<u8>,
    ) -> Result<(), PublishError> {
        if let Some(reason) = lock(&self.failure).clone() {
            return Err(PublishError::new(topic, reason));
        }
        lock(&self.published).push(PublishedMessage {
            topic: topic.to_string(),
            qos,
            retain,
            payload,
        });
        Ok(())
    }
}

// ============================================================================
// HTTP Mock
// ============================================================================

enum Behavior {
    Scripted(VecDeque<Result<HttpReply, TransportError>>),
    DigestDevice {
        realm: String,
        issued: u64,
        accept_status: u16,
    },
}

/// Mock HTTP transport.
///
/// Either replays a fixed script of replies, or behaves like a digest device:
/// requests without `Authorization` get a 401 with a fresh nonce, requests
/// with one get `accept_status`. Every request is recorded.
pub struct MockTransport {
    behavior: Mutex<Behavior>,
    requests: Mutex<Vec<HttpRequest>>,
    latency: Option<Duration>,
}

impl MockTransport {
    /// Replay `replies` in order. Once exhausted, requests fail with a connect error.
    pub fn scripted(replies: Vec<Result<HttpReply, TransportError>>) -> Self {
        Self::with_behavior(Behavior::Scripted(replies.into()))
    }

    /// Simulate a digest device for `realm` accepting authenticated requests with 200.
    pub fn digest_device(realm: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::DigestDevice {
            realm: realm.into(),
            issued: 0,
            accept_status: 200,
        })
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            requests: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    /// Delay every reply by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Status returned for authenticated requests in digest-device mode.
    pub fn with_accept_status(self, status: u16) -> Self {
        if let Behavior::DigestDevice { accept_status, .. } = &mut *lock(&self.behavior) {
            *accept_status = status;
        }
        self
    }

    /// All requests received, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Requests that carried an `Authorization` header.
    pub fn authenticated_requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests)
            .iter()
            .filter(|r| r.header("Authorization").is_some())
            .cloned()
            .collect()
    }

    fn reply_to(&self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        match &mut *lock(&self.behavior) {
            Behavior::Scripted(replies) => replies
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Connect("no scripted reply".into()))),
            Behavior::DigestDevice {
                realm,
                issued,
                accept_status,
            } => {
                if request.header("Authorization").is_some() {
                    return Ok(HttpReply::new(*accept_status));
                }
                *issued += 1;
                Ok(HttpReply::new(401).with_header(
                    "WWW-Authenticate",
                    format!(
                        r#"Digest qop="auth", realm="{}", nonce="nonce-{:04}""#,
                        realm, issued
                    ),
                ))
            }
        }
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpReply, TransportError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        lock(&self.requests).push(request.clone());
        self.reply_to(&request)
    }
}

// ============================================================================
// Nonce Mocks
// ============================================================================

/// Always returns the same client nonce.
#[derive(Clone, Debug)]
pub struct FixedNonce(String);

impl FixedNonce {
    /// Creates a source returning `nonce`.
    pub fn new(nonce: impl Into<String>) -> Self {
        Self(nonce.into())
    }
}

impl NonceSource for FixedNonce {
    fn cnonce(&self) -> String {
        self.0.clone()
    }
}

/// Returns `00000001`, `00000002`, ... as hex client nonces.
#[derive(Debug, Default)]
pub struct SequenceNonce {
    next: AtomicU32,
}

impl SequenceNonce {
    /// Creates a sequence starting at 1.
    pub fn new() -> Self {
        Self::default()
    }
}

impl NonceSource for SequenceNonce {
    fn cnonce(&self) -> String {
        format!("{:08x}", self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

// Mock state stays usable after a panicking test thread.
fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
