//! Application configuration.
//!
//! Loaded from a TOML file with kebab-case keys. Before parsing, every
//! `env(NAME)` or `env(NAME:default)` placeholder in the raw text is replaced
//! by the environment variable, falling back to the default (or nothing).
//!
//! # Example
//!
//! ```rust
//! use rs_curtains::config::{ApiConfig, Config, MqttConfig};
//!
//! // Use defaults
//! let config = Config::default();
//!
//! // Or customize
//! let config = Config::default()
//!     .with_mqtt(MqttConfig::default().with_host("192.168.1.100"))
//!     .with_api(ApiConfig::default().with_port(3000));
//! assert_eq!(config.api.port, 3000);
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default config file name, looked up next to the executable.
pub const DEFAULT_CONFIG_FILE: &str = "rs-curtains.toml";

static ENV_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"env\((?:(.+?)(?::(.+?))?)\)").expect("valid placeholder regex"));

/// Failure loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("unable to read config file {path}: {source}")]
    Io {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The text is not valid configuration TOML.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Replace `env(NAME)` / `env(NAME:default)` placeholders in `raw`.
pub fn substitute_env(raw: &str) -> String {
    substitute_with(raw, |name| std::env::var(name).ok())
}

fn substitute_with(raw: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    ENV_PLACEHOLDER
        .replace_all(raw, |caps: &Captures<'_>| {
            let name = caps.get(1).map_or("", |m| m.as_str());
            lookup(name)
                .or_else(|| caps.get(2).map(|m| m.as_str().to_string()))
                .unwrap_or_default()
        })
        .into_owned()
}

/// Path of the default config file: next to the running executable.
pub fn default_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_CONFIG_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Command API (HTTP router) configuration
    pub api: ApiConfig,
    /// MQTT client configuration
    pub mqtt: MqttConfig,
    /// Outbound HTTP configuration
    pub http: HttpConfig,
    /// Logging configuration
    pub log: LogConfig,
    /// Configured devices
    pub devices: DevicesConfig,
}

impl Config {
    /// Parse configuration text, substituting environment placeholders first.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(&substitute_env(raw))?)
    }

    /// Read and parse the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Set API configuration
    pub fn with_api(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }

    /// Set MQTT configuration
    pub fn with_mqtt(mut self, mqtt: MqttConfig) -> Self {
        self.mqtt = mqtt;
        self
    }

    /// Set outbound HTTP configuration
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Set logging configuration
    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Set device configuration
    pub fn with_devices(mut self, devices: DevicesConfig) -> Self {
        self.devices = devices;
        self
    }
}

// ============================================================================
// API Config
// ============================================================================

/// Command API server configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ApiConfig {
    /// Address to bind
    pub bind: String,
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8080,
            cors_permissive: false,
        }
    }
}

impl ApiConfig {
    /// Set the bind address
    pub fn with_bind(mut self, bind: &str) -> Self {
        self.bind = bind.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// `bind:port` socket address string.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

// ============================================================================
// MQTT Config
// ============================================================================

/// MQTT client configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MqttConfig {
    /// Broker hostname or IP
    pub host: String,
    /// Broker port
    pub port: u16,
    /// Client ID (should be unique per broker)
    pub client_id: String,
    /// Username for authentication (empty = no auth)
    pub username: String,
    /// Password for authentication
    pub password: String,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
    /// Pause before polling again after the connection drops
    pub reconnect_delay_ms: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            client_id: "rs-curtains".into(),
            username: String::new(),
            password: String::new(),
            keep_alive_secs: 5,
            reconnect_delay_ms: 5000,
        }
    }
}

impl MqttConfig {
    /// Set the broker host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.into();
        self
    }

    /// Set the broker port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the client ID
    pub fn with_client_id(mut self, id: &str) -> Self {
        self.client_id = id.into();
        self
    }

    /// Set authentication credentials
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set the keep-alive interval
    pub fn with_keep_alive_secs(mut self, secs: u16) -> Self {
        self.keep_alive_secs = secs;
        self
    }

    /// Set the reconnect delay
    pub fn with_reconnect_delay_ms(mut self, ms: u64) -> Self {
        self.reconnect_delay_ms = ms;
        self
    }

    /// Check if authentication is configured
    pub fn has_auth(&self) -> bool {
        !self.username.is_empty()
    }
}

// ============================================================================
// HTTP / Log Config
// ============================================================================

/// Outbound HTTP (device) configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Whole-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            connect_timeout_ms: 2000,
        }
    }
}

impl HttpConfig {
    /// Set the request timeout
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = ms;
        self
    }
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `rs_curtains=debug`
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Configured devices, keyed by identifier within each class
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DevicesConfig {
    /// Aqara shutters by identifier
    pub aqara_shutters: BTreeMap<String, AqaraShutterConfig>,
    /// Slide curtains by identifier
    pub slide_curtains: BTreeMap<String, SlideCurtainConfig>,
}

impl DevicesConfig {
    /// Add an Aqara shutter
    pub fn with_aqara_shutter(mut self, id: &str, topic: &str) -> Self {
        self.aqara_shutters.insert(
            id.into(),
            AqaraShutterConfig {
                topic: topic.into(),
            },
        );
        self
    }

    /// Add a Slide curtain
    pub fn with_slide_curtain(mut self, id: &str, curtain: SlideCurtainConfig) -> Self {
        self.slide_curtains.insert(id.into(), curtain);
        self
    }

    /// Total number of configured devices
    pub fn len(&self) -> usize {
        self.aqara_shutters.len() + self.slide_curtains.len()
    }

    /// Whether no device is configured
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One Aqara shutter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AqaraShutterConfig {
    /// Topic the shutter's bridge listens on
    pub topic: String,
}

/// One Slide curtain
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SlideCurtainConfig {
    /// Device identifier (digest password)
    pub device_id: String,
    /// Host or `host:port` of the device
    pub ip: String,
    /// Whether to use digest authentication
    #[serde(default = "default_true")]
    pub auth: bool,
    /// Whether a non-2xx final status fails the command
    #[serde(default)]
    pub strict_status: bool,
}

fn default_true() -> bool {
    true
}

impl SlideCurtainConfig {
    /// Curtain at `ip` with the given device identifier, authenticated.
    pub fn new(ip: &str, device_id: &str) -> Self {
        Self {
            device_id: device_id.into(),
            ip: ip.into(),
            auth: true,
            strict_status: false,
        }
    }

    /// Enable or disable digest authentication
    pub fn with_auth(mut self, auth: bool) -> Self {
        self.auth = auth;
        self
    }

    /// Enable or disable strict status checking
    pub fn with_strict_status(mut self, strict: bool) -> Self {
        self.strict_status = strict;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
