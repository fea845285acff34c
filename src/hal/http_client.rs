//! `reqwest`-backed [`HttpTransport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::HttpConfig;
use crate::error::TransportError;
use crate::traits::{HttpReply, HttpRequest, HttpTransport};

/// HTTP transport with bounded connect and request timeouts.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport from timeouts.
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::Connect(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Build a transport from the `[http]` config section.
    pub fn from_config(config: &HttpConfig) -> Result<Self, TransportError> {
        Self::new(
            Duration::from_millis(config.timeout_ms),
            Duration::from_millis(config.connect_timeout_ms),
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Malformed(e.to_string())
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpReply, TransportError> {
        let mut builder = self.client.post(&request.url).body(request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(HttpReply {
            status,
            headers,
            body,
        })
    }
}
