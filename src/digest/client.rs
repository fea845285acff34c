//! Two-phase digest-authenticated POST.

use std::sync::Arc;

use tracing::debug;

use crate::error::DigestError;
use crate::traits::{HttpRequest, HttpTransport, NonceSource};

use super::challenge::Challenge;
use super::session::DigestSession;

/// Username Slide devices expect; the device identifier is the password.
pub const DIGEST_USERNAME: &str = "user";

/// Lower-case hex MD5 of `input`.
pub fn md5_hex(input: &str) -> String {
    hex::encode(md5::compute(input.as_bytes()).0)
}

/// Computed `Authorization` parameters for one authenticated attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigestResponse {
    /// Username sent to the device.
    pub username: String,
    /// Realm from the challenge.
    pub realm: String,
    /// Server nonce from the challenge.
    pub nonce: String,
    /// Request URI, as hashed into HA2.
    pub uri: String,
    /// Quality of protection (`auth`).
    pub qop: String,
    /// Nonce count, 8 digits.
    pub nc: String,
    /// Client nonce.
    pub cnonce: String,
    /// `MD5(HA1:nonce:nc:cnonce:qop:HA2)`.
    pub response: String,
}

impl DigestResponse {
    /// Compute the response for `POST <uri>` in `auth` mode.
    pub fn compute(
        challenge: &Challenge,
        username: &str,
        password: &str,
        uri: &str,
        nc: String,
        cnonce: String,
    ) -> Self {
        let ha1 = md5_hex(&format!("{}:{}:{}", username, challenge.realm, password));
        let ha2 = md5_hex(&format!("POST:{}", uri));
        let response = md5_hex(&format!(
            "{}:{}:{}:{}:{}:{}",
            ha1, challenge.nonce, nc, cnonce, challenge.qop, ha2
        ));

        Self {
            username: username.to_string(),
            realm: challenge.realm.clone(),
            nonce: challenge.nonce.clone(),
            uri: uri.to_string(),
            qop: challenge.qop.clone(),
            nc,
            cnonce,
            response,
        }
    }

    /// Value of the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!(
            r#"Digest username="{}", realm="{}", nonce="{}", uri="{}", response="{}", qop="{}", nc="{}", cnonce="{}""#,
            self.username,
            self.realm,
            self.nonce,
            self.uri,
            self.response,
            self.qop,
            self.nc,
            self.cnonce
        )
    }
}

/// Result of a completed exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigestOutcome {
    /// Status of the authenticated retry. Not checked by the client itself.
    pub status: u16,
    /// Nonce count used for the retry.
    pub nc: String,
}

impl DigestOutcome {
    /// True for 2xx retry statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Digest `auth` client for one device endpoint.
pub struct DigestClient {
    transport: Arc<dyn HttpTransport>,
    nonces: Arc<dyn NonceSource>,
    username: String,
    password: String,
}

impl DigestClient {
    /// Create a client authenticating as [`DIGEST_USERNAME`] with `password`.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        nonces: Arc<dyn NonceSource>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            nonces,
            username: DIGEST_USERNAME.to_string(),
            password: password.into(),
        }
    }

    /// POST `body` to `<base_url><uri>`: probe, parse the challenge, retry authenticated.
    ///
    /// The caller holds `session` exclusively for the whole exchange, which
    /// keeps `nc` values unique per device.
    pub async fn post(
        &self,
        session: &mut DigestSession,
        base_url: &str,
        uri: &str,
        body: Vec<u8>,
    ) -> Result<DigestOutcome, DigestError> {
        let url = format!("{}{}", base_url, uri);
        let request = HttpRequest::post(&url).with_header("Content-Type", "application/json");

        let probe = self.transport.post(request.clone()).await?;
        if probe.status != 401 {
            return Err(DigestError::UnexpectedStatus(probe.status));
        }

        let header = probe
            .header("www-authenticate")
            .filter(|h| !h.is_empty())
            .ok_or(DigestError::MissingChallenge)?;

        let challenge = Challenge::parse(header).map_err(|e| {
            debug!("unusable auth challenge from {}: {}", url, header);
            e
        })?;

        let nc = session.next_nc();
        let digest = DigestResponse::compute(
            &challenge,
            &self.username,
            &self.password,
            uri,
            nc.clone(),
            self.nonces.cnonce(),
        );
        debug!(url = %url, realm = %digest.realm, nc = %nc, "sending authenticated request");

        let reply = self
            .transport
            .post(
                request
                    .with_header("Authorization", digest.header_value())
                    .with_body(body),
            )
            .await?;

        Ok(DigestOutcome {
            status: reply.status,
            nc,
        })
    }
}
