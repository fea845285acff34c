//! Aqara roller shutters, driven by publishing to an MQTT topic.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::error::DeviceError;
use crate::position::to_percent;
use crate::traits::{DeliveryQos, DeviceClass, MessagePublisher, PositionDevice};

/// Payload understood by the shutter bridge.
#[derive(Debug, Serialize)]
pub struct AqaraPositionRequest {
    /// Target position in percent.
    pub position: i64,
}

/// Messaging driver for one shutter.
///
/// Publishing is fire and forget: success means the client accepted the
/// message, not that the shutter moved.
pub struct AqaraShutter {
    publisher: Arc<dyn MessagePublisher>,
    topic: String,
}

impl AqaraShutter {
    /// Bind a shutter to `topic` on the shared publisher.
    pub fn new(publisher: Arc<dyn MessagePublisher>, topic: impl Into<String>) -> Self {
        Self {
            publisher,
            topic: topic.into(),
        }
    }

    /// Topic this shutter listens on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Encode a position as the shutter payload.
    pub fn encode(position: f64) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&AqaraPositionRequest {
            position: to_percent(position),
        })
    }
}

#[async_trait]
impl PositionDevice for AqaraShutter {
    fn class(&self) -> DeviceClass {
        DeviceClass::AqaraShutter
    }

    async fn try_set_position(&self, position: f64) -> Result<(), DeviceError> {
        let payload = Self::encode(position)?;
        debug!(topic = %self.topic, "publishing shutter position {}", position);
        self.publisher
            .publish(&self.topic, DeliveryQos::AtMostOnce, false, payload)
            .await?;
        Ok(())
    }
}
