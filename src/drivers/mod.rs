//! Device drivers.
//!
//! Each driver implements [`PositionDevice`](crate::traits::PositionDevice)
//! for one hardware family:
//!
//! - [`aqara::AqaraShutter`]: percentage payload published over MQTT
//! - [`slide::SlideCurtain`]: digest-authenticated HTTP RPC

pub mod aqara;
pub mod slide;

pub use aqara::{AqaraPositionRequest, AqaraShutter};
pub use slide::{SlideCurtain, SlidePositionRequest, SET_POSITION_URI};
