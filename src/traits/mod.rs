//! Trait definitions for device drivers and the capabilities they consume.
//!
//! # Submodules
//!
//! - `device`: the [`PositionDevice`] command contract
//! - `network`: message-bus, HTTP and nonce capabilities
//!
//! Drivers implement [`PositionDevice`]; the registry stores them as
//! `Arc<dyn PositionDevice>`. Concrete capabilities live in [`crate::hal`]
//! (mocks, reqwest) and [`crate::services`] (rumqttc).

pub mod device;
pub mod network;

pub use device::*;
pub use network::*;
