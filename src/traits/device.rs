//! The uniform command contract implemented by every device driver.

use async_trait::async_trait;

use crate::error::DeviceError;

/// Hardware family a driver belongs to.
///
/// Identifiers are unique per class, not globally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// Aqara roller shutters driven over MQTT.
    AqaraShutter,
    /// Slide curtain motors driven over digest-authenticated HTTP.
    SlideCurtain,
}

impl DeviceClass {
    /// Noun used in user-facing messages.
    pub const fn noun(&self) -> &'static str {
        match self {
            DeviceClass::AqaraShutter => "shutter",
            DeviceClass::SlideCurtain => "curtain",
        }
    }

    /// Router path serving this class.
    pub const fn route(&self) -> &'static str {
        match self {
            DeviceClass::AqaraShutter => "/shutter/aqara",
            DeviceClass::SlideCurtain => "/curtain/slide",
        }
    }
}

/// A window covering that can be moved to a normalized position.
///
/// `position` is nominally in `[0, 1]`. How out-of-range values are handled is
/// up to the driver, but the value is never forwarded verbatim to a device
/// whose native range differs.
#[async_trait]
pub trait PositionDevice: Send + Sync {
    /// Device family of this driver.
    fn class(&self) -> DeviceClass;

    /// Move the device, reporting why it failed.
    async fn try_set_position(&self, position: f64) -> Result<(), DeviceError>;

    /// Move the device. Every failure collapses to `false`.
    async fn set_position(&self, position: f64) -> bool {
        match self.try_set_position(position).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    class = ?self.class(),
                    kind = ?e.kind(),
                    "set_position({}) failed: {}",
                    position,
                    e
                );
                false
            }
        }
    }
}
