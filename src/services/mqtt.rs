//! MQTT client used to drive the shutters.
//!
//! [`connect`] returns a [`MqttPublisher`], the [`MessagePublisher`] shared by
//! every shutter, and a [`MqttConnection`] that must be polled for anything
//! to reach the broker:
//!
//! ```ignore
//! let (publisher, connection) = connect(&MqttRuntimeConfig::from_config(&config.mqtt));
//! tokio::spawn(connection.run());
//! ```
//!
//! The connection reconnects on its own: after an error it waits
//! `reconnect_delay` and polls again.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tracing::{debug, info, warn};

use crate::config::MqttConfig;
use crate::error::PublishError;
use crate::traits::{DeliveryQos, MessagePublisher};

/// Smallest keep-alive interval accepted by the client.
pub const MIN_KEEP_ALIVE_SECS: u16 = 5;

/// Capacity of the outgoing request queue.
pub const REQUEST_CAPACITY: usize = 10;

// ============================================================================
// Configuration
// ============================================================================

/// Runtime MQTT client configuration for `rumqttc`.
#[derive(Debug, Clone)]
pub struct MqttRuntimeConfig {
    /// MQTT broker hostname
    pub host: String,
    /// MQTT broker port
    pub port: u16,
    /// Client ID
    pub client_id: String,
    /// Username and password, if the broker requires them
    pub credentials: Option<(String, String)>,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
    /// Pause before polling again after a connection error
    pub reconnect_delay: Duration,
}

impl Default for MqttRuntimeConfig {
    fn default() -> Self {
        Self::from_config(&MqttConfig::default())
    }
}

impl MqttRuntimeConfig {
    /// Create a new config with the given broker address
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Create from the `[mqtt]` config section
    pub fn from_config(config: &MqttConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            client_id: config.client_id.clone(),
            credentials: config
                .has_auth()
                .then(|| (config.username.clone(), config.password.clone())),
            keep_alive_secs: config.keep_alive_secs,
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
        }
    }

    /// Set the client ID
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = id.into();
        self
    }

    /// Set broker credentials
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Client options for this configuration.
    pub fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(Duration::from_secs(
            self.keep_alive_secs.max(MIN_KEEP_ALIVE_SECS) as u64,
        ));
        if let Some((username, password)) = &self.credentials {
            options.set_credentials(username, password);
        }
        options
    }
}

// ============================================================================
// Publisher
// ============================================================================

/// [`MessagePublisher`] backed by a `rumqttc` client.
///
/// Cheap to clone; all clones feed the same connection. Publishing never
/// waits: once [`REQUEST_CAPACITY`] messages are queued behind a broker that
/// is unreachable, further publishes fail until the queue drains.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    /// Wrap an existing client.
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

/// Map the crate's delivery guarantee onto the client's.
pub fn to_qos(qos: DeliveryQos) -> QoS {
    match qos {
        DeliveryQos::AtMostOnce => QoS::AtMostOnce,
        DeliveryQos::AtLeastOnce => QoS::AtLeastOnce,
        DeliveryQos::ExactlyOnce => QoS::ExactlyOnce,
    }
}

#[async_trait]
impl MessagePublisher for MqttPublisher {
    async fn publish(
        &self,
        topic: &str,
        qos: DeliveryQos,
        retain: bool,
        payload: Vec<u8>,
    ) -> Result<(), PublishError> {
        self.client
            .try_publish(topic, to_qos(qos), retain, payload)
            .map_err(|e| PublishError::new(topic, e.to_string()))
    }
}

// ============================================================================
// Connection
// ============================================================================

/// The network side of the client. Nothing is sent until [`run`](Self::run) is polled.
pub struct MqttConnection {
    eventloop: EventLoop,
    broker: String,
    reconnect_delay: Duration,
}

impl MqttConnection {
    /// Drive the connection forever, reconnecting after errors.
    pub async fn run(mut self) {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!(broker = %self.broker, code = ?ack.code, "Connected to MQTT broker");
                }
                Ok(event) => debug!("MQTT event: {:?}", event),
                Err(e) => {
                    warn!(broker = %self.broker, "Connection to MQTT broker lost: {}", e);
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        }
    }
}

/// Create the client. Connection is attempted once [`MqttConnection::run`] is polled.
pub fn connect(config: &MqttRuntimeConfig) -> (MqttPublisher, MqttConnection) {
    let (client, eventloop) = AsyncClient::new(config.options(), REQUEST_CAPACITY);
    let connection = MqttConnection {
        eventloop,
        broker: format!("{}:{}", config.host, config.port),
        reconnect_delay: config.reconnect_delay,
    };
    (MqttPublisher::new(client), connection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_config_defaults() {
        let config = MqttRuntimeConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 1883);
        assert_eq!(config.client_id, "rs-curtains");
        assert!(config.credentials.is_none());
        assert_eq!(config.keep_alive_secs, 5);
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
    }

    #[test]
    fn runtime_config_from_config() {
        let shared = MqttConfig::default()
            .with_host("mqtt.test.com")
            .with_port(8883)
            .with_client_id("test-id")
            .with_auth("curtains", "hunter2")
            .with_keep_alive_secs(30)
            .with_reconnect_delay_ms(250);

        let config = MqttRuntimeConfig::from_config(&shared);
        assert_eq!(config.host, "mqtt.test.com");
        assert_eq!(config.port, 8883);
        assert_eq!(config.client_id, "test-id");
        assert_eq!(
            config.credentials,
            Some(("curtains".to_string(), "hunter2".to_string()))
        );
        assert_eq!(config.keep_alive_secs, 30);
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
    }

    #[test]
    fn runtime_config_builder() {
        let config = MqttRuntimeConfig::new("broker.local", 1884)
            .client_id("custom-id")
            .credentials("u", "p");
        assert_eq!(config.host, "broker.local");
        assert_eq!(config.port, 1884);
        assert_eq!(config.client_id, "custom-id");
        assert!(config.credentials.is_some());
    }

    #[test]
    fn options_raise_short_keep_alive() {
        let mut config = MqttRuntimeConfig::new("broker.local", 1883);
        config.keep_alive_secs = 1;
        let options = config.options();
        assert_eq!(options.keep_alive(), Duration::from_secs(5));
        assert_eq!(options.broker_address(), ("broker.local".to_string(), 1883));
    }

    #[test]
    fn qos_mapping() {
        assert_eq!(to_qos(DeliveryQos::AtMostOnce), QoS::AtMostOnce);
        assert_eq!(to_qos(DeliveryQos::AtLeastOnce), QoS::AtLeastOnce);
        assert_eq!(to_qos(DeliveryQos::ExactlyOnce), QoS::ExactlyOnce);
    }

    #[tokio::test]
    async fn publish_is_queued_while_connection_is_alive() {
        let (publisher, _connection) = connect(&MqttRuntimeConfig::default());
        let result = publisher
            .publish("z2m/kitchen/set", DeliveryQos::AtMostOnce, false, b"{}".to_vec())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn publish_returns_promptly_while_broker_is_unreachable() {
        let mut config = MqttRuntimeConfig::new("127.0.0.1", 1);
        config.reconnect_delay = Duration::from_millis(50);
        let (publisher, connection) = connect(&config);
        let handle = tokio::spawn(connection.run());

        let mut results = Vec::new();
        for _ in 0..REQUEST_CAPACITY + 5 {
            let result = tokio::time::timeout(
                Duration::from_secs(2),
                publisher.publish("z2m/kitchen/set", DeliveryQos::AtMostOnce, false, b"{}".to_vec()),
            )
            .await
            .expect("publish must not wait for the broker");
            results.push(result);
        }
        handle.abort();

        let last = results.last().unwrap();
        assert_eq!(last.as_ref().unwrap_err().topic, "z2m/kitchen/set");
    }

    #[tokio::test]
    async fn publish_fails_once_connection_is_dropped() {
        let (publisher, connection) = connect(&MqttRuntimeConfig::default());
        drop(connection);

        let err = publisher
            .publish("z2m/kitchen/set", DeliveryQos::AtMostOnce, false, b"{}".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.topic, "z2m/kitchen/set");
    }
}
