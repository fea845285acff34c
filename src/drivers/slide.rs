//! Slide curtain motors, driven over the device's local RPC API.
//!
//! Slides protect their API with HTTP digest authentication: username `user`,
//! password the device identifier printed on the unit.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::digest::{DigestClient, DigestSession};
use crate::error::{DeviceError, DigestError};
use crate::position::clamp_unit;
use crate::traits::{DeviceClass, HttpRequest, HttpTransport, NonceSource, PositionDevice};

/// RPC endpoint for moving the curtain.
pub const SET_POSITION_URI: &str = "/rpc/Slide.SetPos";

/// Body of a `Slide.SetPos` call.
#[derive(Debug, Serialize)]
pub struct SlidePositionRequest {
    /// Target position in `[0, 1]`.
    pub pos: f64,
}

/// Authenticated HTTP driver for one Slide.
pub struct SlideCurtain {
    device_id: String,
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    client: DigestClient,
    // Held for a whole exchange: one authenticated request in flight per device.
    session: Mutex<DigestSession>,
    auth: bool,
    strict_status: bool,
}

impl SlideCurtain {
    /// Bind a curtain at `ip` (host or `host:port`) authenticating with `device_id`.
    pub fn new(
        ip: &str,
        device_id: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        nonces: Arc<dyn NonceSource>,
    ) -> Self {
        let device_id = device_id.into();
        Self {
            client: DigestClient::new(Arc::clone(&transport), nonces, device_id.clone()),
            device_id,
            base_url: format!("http://{}", ip),
            transport,
            session: Mutex::new(DigestSession::new()),
            auth: true,
            strict_status: false,
        }
    }

    /// Whether requests use digest authentication (default `true`).
    pub fn with_auth(mut self, auth: bool) -> Self {
        self.auth = auth;
        self
    }

    /// Whether a non-2xx final status fails the command (default `false`).
    pub fn with_strict_status(mut self, strict: bool) -> Self {
        self.strict_status = strict;
        self
    }

    /// Device identifier used as the digest password.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Full URL of the set-position endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, SET_POSITION_URI)
    }

    /// Authenticated attempts made so far.
    pub async fn nonce_count(&self) -> u64 {
        self.session.lock().await.nonce_count()
    }

    /// Encode a position as the RPC body, clamping into `[0, 1]`.
    pub fn encode(position: f64) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&SlidePositionRequest {
            pos: clamp_unit(position),
        })
    }

    async fn post_authenticated(&self, body: Vec<u8>) -> Result<(), DeviceError> {
        let mut session = self.session.lock().await;
        let outcome = self
            .client
            .post(&mut session, &self.base_url, SET_POSITION_URI, body)
            .await?;

        if !outcome.is_success() {
            if self.strict_status {
                return Err(DigestError::Rejected(outcome.status).into());
            }
            warn!(
                device = %self.device_id,
                nc = %outcome.nc,
                "authenticated request answered with status {}",
                outcome.status
            );
        }
        Ok(())
    }

    async fn post_plain(&self, body: Vec<u8>) -> Result<(), DeviceError> {
        let request = HttpRequest::post(self.endpoint())
            .with_header("Content-Type", "application/json")
            .with_body(body);
        let reply = self.transport.post(request).await?;

        if self.strict_status && !reply.is_success() {
            return Err(DeviceError::Rejected(reply.status));
        }
        Ok(())
    }
}

#[async_trait]
impl PositionDevice for SlideCurtain {
    fn class(&self) -> DeviceClass {
        DeviceClass::SlideCurtain
    }

    async fn try_set_position(&self, position: f64) -> Result<(), DeviceError> {
        let body = Self::encode(position)?;
        debug!(device = %self.device_id, url = %self.endpoint(), "setting curtain position {}", position);

        if self.auth {
            self.post_authenticated(body).await
        } else {
            self.post_plain(body).await
        }
    }
}
