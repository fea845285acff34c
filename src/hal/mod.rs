//! Concrete implementations of the capability traits in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: test doubles for the publisher, HTTP transport and nonce source
//! - `http_client`: `reqwest`-backed HTTP transport used in production
//!
//! The rumqttc publisher lives in `services::mqtt` (requires `mqtt` feature).

pub mod http_client;
pub mod mock;

pub use http_client::*;
pub use mock::*;
