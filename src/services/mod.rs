//! Network services around the drivers.
//!
//! - `web` feature: Axum-based command API
//! - `mqtt` feature: `rumqttc` client backing the shutter publisher
//!
//! Both are independent of each other; the binary wires them together
//! through a shared [`DeviceRegistry`](crate::registry::DeviceRegistry).

// API types are only used by the router
#[cfg(feature = "web")]
pub mod api;

#[cfg(feature = "web")]
pub mod web;

#[cfg(feature = "mqtt")]
pub mod mqtt;

// Re-exports
#[cfg(feature = "web")]
pub use api::*;

#[cfg(feature = "web")]
pub use web::*;

#[cfg(feature = "mqtt")]
pub use mqtt::*;
