//! Lookup of configured devices by class and identifier.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::config::DevicesConfig;
use crate::drivers::{AqaraShutter, SlideCurtain};
use crate::traits::{DeviceClass, HttpTransport, MessagePublisher, NonceSource, PositionDevice};

/// Immutable set of drivers, shared by every request handler.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: HashMap<DeviceClass, HashMap<String, Arc<dyn PositionDevice>>>,
}

impl DeviceRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build drivers for every configured device.
    ///
    /// Shutters share `publisher`; curtains share `transport` and `nonces`
    /// but each owns its own digest session.
    pub fn from_config(
        config: &DevicesConfig,
        publisher: Arc<dyn MessagePublisher>,
        transport: Arc<dyn HttpTransport>,
        nonces: Arc<dyn NonceSource>,
    ) -> Self {
        let mut registry = Self::new();

        for (id, shutter) in &config.aqara_shutters {
            info!(device = %id, topic = %shutter.topic, "registered Aqara shutter");
            registry.insert(
                id.clone(),
                Arc::new(AqaraShutter::new(Arc::clone(&publisher), shutter.topic.clone())),
            );
        }

        for (id, curtain) in &config.slide_curtains {
            info!(device = %id, ip = %curtain.ip, auth = curtain.auth, "registered Slide curtain");
            let slide = SlideCurtain::new(
                &curtain.ip,
                curtain.device_id.clone(),
                Arc::clone(&transport),
                Arc::clone(&nonces),
            )
            .with_auth(curtain.auth)
            .with_strict_status(curtain.strict_status);
            registry.insert(id.clone(), Arc::new(slide));
        }

        registry
    }

    /// Add a device under its own class, replacing any previous entry with that identifier.
    pub fn insert(&mut self, id: impl Into<String>, device: Arc<dyn PositionDevice>) {
        self.devices
            .entry(device.class())
            .or_default()
            .insert(id.into(), device);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_device(mut self, id: impl Into<String>, device: Arc<dyn PositionDevice>) -> Self {
        self.insert(id, device);
        self
    }

    /// Exact-match lookup within `class`.
    pub fn get(&self, class: DeviceClass, id: &str) -> Option<Arc<dyn PositionDevice>> {
        self.devices.get(&class)?.get(id).cloned()
    }

    /// Identifiers registered under `class`, sorted.
    pub fn ids(&self, class: DeviceClass) -> Vec<String> {
        let mut ids: Vec<String> = self
            .devices
            .get(&class)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Total number of devices.
    pub fn len(&self) -> usize {
        self.devices.values().map(HashMap::len).sum()
    }

    /// Whether no device is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
