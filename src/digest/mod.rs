//! RFC 2617 digest authentication (`qop=auth`, MD5) for device RPC calls.
//!
//! An exchange is always two round trips:
//!
//! ```text
//! POST /rpc/Slide.SetPos              (no Authorization, empty body)
//!   <- 401  WWW-Authenticate: Digest qop="auth", realm="...", nonce="..."
//! POST /rpc/Slide.SetPos              Authorization: Digest username="user", ...
//!   <- status (reported, not judged)
//! ```
//!
//! The challenge is never reused: devices hand out a fresh nonce for every
//! probe. The nonce count lives in a [`DigestSession`] owned by the driver.

pub mod challenge;
pub mod client;
pub mod session;

pub use challenge::Challenge;
pub use client::{md5_hex, DigestClient, DigestOutcome, DigestResponse, DIGEST_USERNAME};
pub use session::DigestSession;
