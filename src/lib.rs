//! # rs-curtains
//!
//! A small command API for motorized window coverings: Aqara roller shutters
//! reached over MQTT and Slide curtains reached over digest-authenticated HTTP.
//!
//! ## Features
//!
//! - **Uniform command contract**: every driver implements [`PositionDevice`]
//! - **Digest authentication**: RFC 2617 `qop=auth` with a per-device nonce counter
//! - **Per-device serialization**: one authenticated exchange in flight per curtain
//! - **Injectable capabilities**: publisher, HTTP transport and nonce source are traits
//!
//! ## Architecture
//!
//! - `traits` - Command contract and transport capabilities
//! - `digest` - Challenge parsing, nonce counting and the probe/retry client
//! - `drivers` - Aqara and Slide drivers
//! - `registry` - Device lookup by class and identifier
//! - `hal` - Concrete capabilities (mock for testing, reqwest for devices)
//! - `services` - HTTP router and MQTT client (feature-gated)
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rs_curtains::{
//!     drivers::SlideCurtain,
//!     hal::{FixedNonce, MockTransport},
//!     traits::PositionDevice,
//! };
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let transport = Arc::new(MockTransport::digest_device("slide-device"));
//! let curtain = SlideCurtain::new(
//!     "192.168.1.40",
//!     "a1b2c3d4e5f6",
//!     transport.clone(),
//!     Arc::new(FixedNonce::new("deadbeef")),
//! );
//!
//! assert!(curtain.set_position(0.5).await);
//! assert_eq!(curtain.nonce_count().await, 1);
//! # });
//! ```

#![warn(missing_docs)]

/// TOML configuration with environment placeholders.
pub mod config;
/// HTTP digest authentication client.
pub mod digest;
/// Device drivers implementing the command contract.
pub mod drivers;
/// Error types and their classification.
pub mod error;
/// Capability implementations with mocks for testing.
pub mod hal;
/// Log subscriber setup.
pub mod logging;
/// Command query parameter parsing.
pub mod parsing;
/// Position conversions for device wire formats.
pub mod position;
/// Device lookup by class and identifier.
pub mod registry;
/// Command contract and capability traits.
pub mod traits;

/// Network services for the HTTP API and MQTT (feature-gated).
#[cfg(any(feature = "web", feature = "mqtt"))]
pub mod services;

// Re-exports for convenience
pub use config::Config;
pub use digest::{Challenge, DigestClient, DigestOutcome, DigestSession};
pub use drivers::{AqaraShutter, SlideCurtain};
pub use error::{DeviceError, DigestError, ErrorKind, PublishError, TransportError};
pub use registry::DeviceRegistry;
pub use traits::{
    DeliveryQos, DeviceClass, HttpReply, HttpRequest, HttpTransport, MessagePublisher,
    NonceSource, PositionDevice, RandomNonce,
};
