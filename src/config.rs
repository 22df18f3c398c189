//! Configuration Module
//!
//! Provides configuration management for the Contact relay and its driver.
//! Values are layered: built-in defaults, then an optional YAML file, then
//! environment variables (`CONTACT_SERVER__PORT`, `CONTACT_MESSAGING__HOST`, ...).
//!
//! # License
//! Licensed under the AGPLv3 license.

use std::time::Duration;

use config::{Config as ConfigFile, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::envelope::SenderIdentity;

/// Default location of the service configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/contact.yml";

/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_PATH_ENV: &str = "CONTACT_CONFIG";

/// Which `Contact` implementation the server exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    /// Forward every message to the Messaging service
    #[default]
    Relay,
    /// Echo the request back without a downstream call
    Echo,
}

/// Inbound gRPC server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Ceiling on requests handled at the same time
    pub max_concurrent_requests: usize,
    /// Time in-flight requests get to finish after a shutdown signal
    pub shutdown_grace_secs: u64,
    /// Service implementation to expose
    pub mode: ServiceMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_concurrent_requests: 10,
            shutdown_grace_secs: 0,
            mode: ServiceMode::Relay,
        }
    }
}

impl ServerConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// Downstream Messaging service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessagingConfig {
    /// Messaging service host
    pub host: String,
    /// Messaging service port
    pub port: u16,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            host: "messaging-service".to_string(),
            port: 8080,
            timeout_secs: 10,
        }
    }
}

impl MessagingConfig {
    /// `host:port` of the Messaging service.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URI used to build the gRPC channel.
    pub fn endpoint_uri(&self) -> String {
        format!("http://{}", self.target())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Relay behavior configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RelayConfig {
    /// Sender stamped on every forwarded message
    pub sender: SenderIdentity,
}

/// Application configuration settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Inbound server configuration
    pub server: ServerConfig,
    /// Downstream Messaging configuration
    pub messaging: MessagingConfig,
    /// Relay configuration
    pub relay: RelayConfig,
}

/// Settings for the `contact-client` driver
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Contact service host
    pub host: String,
    /// Contact service port
    pub port: u16,
    /// Call deadline in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            timeout_secs: 10,
        }
    }
}

impl ClientConfig {
    /// Loads driver settings from `CONTACT_CLIENT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let builder = ConfigFile::builder()
            .add_source(ConfigFile::try_from(&ClientConfig::default())?)
            .add_source(Environment::with_prefix("CONTACT_CLIENT").try_parsing(true));

        builder
            .build()?
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn endpoint_uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    #[error("Invalid config value {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl Config {
    /// Loads configuration from the default file location.
    ///
    /// # Configuration Sources
    /// Later sources override earlier ones:
    /// 1. Built-in defaults
    /// 2. YAML file at `$CONTACT_CONFIG` or `config/contact.yml`, if present
    /// 3. Environment variables prefixed with `CONTACT_`, nested keys separated by `__`
    ///
    /// # Examples
    /// ```no_run
    /// use contact_relay::config::Config;
    ///
    /// let config = Config::new().expect("Failed to load configuration");
    /// println!("Messaging target: {}", config.messaging.target());
    /// ```
    pub fn new() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(&path)
    }

    /// Loads configuration with `path` as the (optional) file layer.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let builder = ConfigFile::builder()
            .add_source(ConfigFile::try_from(&Config::default())?)
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("CONTACT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Config = builder
            .build()?
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the service cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.max_concurrent_requests == 0 {
            return Err(ConfigError::InvalidValue {
                key: "server.max_concurrent_requests",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.messaging.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "messaging.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.server.mode == ServiceMode::Relay && self.messaging.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "messaging.host",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
