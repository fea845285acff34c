//! Error types shared by the device drivers and their transports.
//!
//! Every failure a driver can hit is classified as one of three kinds so the
//! router (and logs) can tell a dead network apart from a misbehaving device:
//!
//! | Kind | Examples |
//! |------|----------|
//! | [`ErrorKind::Transport`] | connection refused, timeout, truncated response, broker unreachable |
//! | [`ErrorKind::Protocol`] | probe not answered with 401, missing or unusable challenge |
//! | [`ErrorKind::Rejected`] | device refused the authenticated request (strict mode only) |

use thiserror::Error;

/// Coarse classification of a device command failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a usable response.
    Transport,
    /// The device answered, but not the way the protocol requires.
    Protocol,
    /// The device answered the authenticated request with a non-success status.
    Rejected,
}

/// Failure of a single HTTP round trip.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Could not connect to the device.
    #[error("connection failed: {0}")]
    Connect(String),
    /// Connect or request timeout elapsed.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The response could not be read or was not valid HTTP.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Failure of a digest-authenticated exchange.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DigestError {
    /// A round trip failed at the transport level.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The unauthenticated probe was not answered with 401.
    #[error("unexpected status code, expected 401 (with auth challenge), got {0}")]
    UnexpectedStatus(u16),

    /// The 401 response carried no `WWW-Authenticate` header.
    #[error("no auth challenge present in initial response from device (expected www-authenticate header)")]
    MissingChallenge,

    /// The challenge lacks one of `qop`, `realm` or `nonce`.
    #[error("auth challenge is missing {field} (was: {challenge})")]
    IncompleteChallenge {
        /// Name of the first missing parameter.
        field: &'static str,
        /// Raw `WWW-Authenticate` value, kept for diagnosis.
        challenge: String,
    },

    /// The challenge offers no `auth` quality of protection.
    #[error("auth challenge offers unsupported qop '{qop}' (was: {challenge})")]
    UnsupportedQop {
        /// The offered qop value.
        qop: String,
        /// Raw `WWW-Authenticate` value, kept for diagnosis.
        challenge: String,
    },

    /// The authenticated retry completed with a non-success status.
    #[error("device rejected authenticated request with status {0}")]
    Rejected(u16),
}

impl DigestError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Rejected(_) => ErrorKind::Rejected,
            Self::UnexpectedStatus(_)
            | Self::MissingChallenge
            | Self::IncompleteChallenge { .. }
            | Self::UnsupportedQop { .. } => ErrorKind::Protocol,
        }
    }
}

/// The message bus did not accept a publish.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("publish to '{topic}' failed: {reason}")]
pub struct PublishError {
    /// Topic the payload was addressed to.
    pub topic: String,
    /// Reason reported by the client.
    pub reason: String,
}

impl PublishError {
    /// Create a new publish error.
    pub fn new(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            reason: reason.into(),
        }
    }
}

/// Failure of a `set_position` command, before it is collapsed to `false`.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Digest-authenticated exchange failed.
    #[error(transparent)]
    Digest(#[from] DigestError),

    /// Plain (unauthenticated) request failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Message bus rejected the publish.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Unauthenticated request completed with a non-success status (strict mode only).
    #[error("device rejected request with status {0}")]
    Rejected(u16),

    /// Payload could not be encoded.
    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl DeviceError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Digest(e) => e.kind(),
            Self::Transport(_) | Self::Publish(_) => ErrorKind::Transport,
            Self::Rejected(_) => ErrorKind::Rejected,
            Self::Encode(_) => ErrorKind::Protocol,
        }
    }
}
