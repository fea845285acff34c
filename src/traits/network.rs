//! Network capability traits consumed by the device drivers.
//!
//! The drivers never talk to a socket directly. They are handed one of these
//! capabilities, which keeps them testable without a broker or a real device.
//!
//! # Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`MessagePublisher`] | Publish a payload to a message-bus topic |
//! | [`HttpTransport`] | POST with custom headers, returning status, headers and body |
//! | [`NonceSource`] | Client nonces for digest authentication |
//!
//! # Wire Formats
//!
//! ```text
//! aqara shutter  -> <topic>              {"position": 73}
//! slide curtain  -> POST /rpc/Slide.SetPos {"pos": 0.73}
//! ```

use async_trait::async_trait;
use rand::RngCore;

use crate::error::{PublishError, TransportError};

// ============================================================================
// Message Bus
// ============================================================================

/// MQTT delivery guarantee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DeliveryQos {
    /// QoS 0, fire and forget.
    #[default]
    AtMostOnce,
    /// QoS 1.
    AtLeastOnce,
    /// QoS 2.
    ExactlyOnce,
}

/// Publish capability of a message-bus client.
///
/// Implementations report `Ok` once the client has accepted the message. There
/// is no confirmation that any subscriber received it.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish `payload` to `topic`.
    async fn publish(
        &self,
        topic: &str,
        qos: DeliveryQos,
        retain: bool,
        payload: Vec<u8>,
    ) -> Result<(), PublishError>;
}

// ============================================================================
// HTTP
// ============================================================================

/// An outgoing POST request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HttpRequest {
    /// Absolute URL, e.g. `http://192.168.1.40/rpc/Slide.SetPos`.
    pub url: String,
    /// Header name/value pairs, sent in order.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Create a request with no headers and an empty body.
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set or replace a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Look up a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Response to an [`HttpRequest`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpReply {
    /// Create a reply with the given status and no headers.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// POST capability of an HTTP client.
///
/// Every call must be bounded by a timeout; implementations never wait forever.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request` and return the full response.
    async fn post(&self, request: HttpRequest) -> Result<HttpReply, TransportError>;
}

// ============================================================================
// Randomness
// ============================================================================

/// Source of digest client nonces.
///
/// Nonces only need to be unpredictable enough for replay hygiene, not secret.
pub trait NonceSource: Send + Sync {
    /// Return 8 lower-case hex characters.
    fn cnonce(&self) -> String;
}

/// [`NonceSource`] backed by the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomNonce;

impl NonceSource for RandomNonce {
    fn cnonce(&self) -> String {
        let mut bytes = [0u8; 4];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}
