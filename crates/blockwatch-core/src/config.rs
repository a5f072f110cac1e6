//! Configuration loading and typed config structures for Blockwatch.
//!
//! The bridge reads `blockwatch.yaml` (see the copy at the workspace root).
//! Every field has a default, so a partial file or no file at all is valid.
//! A handful of deployment-specific values can be overridden from the
//! environment.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::classify::ParseMode;
use crate::store::TrackMapping;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level bridge configuration.
///
/// Mirrors the structure of `blockwatch.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BridgeConfig {
    /// Where status lines come from.
    #[serde(default)]
    pub transport: TransportConfig,

    /// How lines are matched and tracks mapped.
    #[serde(default)]
    pub parsing: ParsingConfig,

    /// Display hand-off tuning.
    #[serde(default)]
    pub publisher: PublisherConfig,

    /// Read-side HTTP surface.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override file values:
    /// - `BLOCKWATCH_SOURCE_ADDR` overrides `transport.address`
    /// - `BLOCKWATCH_OBSERVER_PORT` overrides `observer.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is unusable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] or [`ConfigError::Invalid`].
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an override does not parse.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(address) = lookup("BLOCKWATCH_SOURCE_ADDR") {
            self.transport.address = address;
        }
        if let Some(port) = lookup("BLOCKWATCH_OBSERVER_PORT") {
            self.observer.port = port.parse().map_err(|e| {
                ConfigError::Invalid(format!("invalid BLOCKWATCH_OBSERVER_PORT {port:?}: {e}"))
            })?;
        }
        Ok(())
    }

    /// Reject values that would make the bridge unusable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.publisher.queue_capacity == 0 {
            return Err(ConfigError::Invalid(String::from(
                "publisher.queue_capacity must be at least 1",
            )));
        }
        if self.publisher.send_timeout_ms == 0 {
            return Err(ConfigError::Invalid(String::from(
                "publisher.send_timeout_ms must be at least 1",
            )));
        }
        if self.transport.kind == TransportKind::Tcp && self.transport.address.is_empty() {
            return Err(ConfigError::Invalid(String::from(
                "transport.address is required for tcp transport",
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Which byte stream carries status lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// A TCP connection to the controller (or a serial-to-network bridge).
    #[default]
    Tcp,
    /// Standard input, for piping captures or `socat` serial bridges.
    Stdin,
}

/// Transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransportConfig {
    /// Which transport to open.
    #[serde(default)]
    pub kind: TransportKind,

    /// `host:port` of the controller for [`TransportKind::Tcp`].
    #[serde(default = "default_address")]
    pub address: String,

    /// Wait between reconnect attempts.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl TransportConfig {
    /// Reconnect delay as a [`Duration`].
    pub const fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::default(),
            address: default_address(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

fn default_address() -> String {
    String::from("127.0.0.1:2560")
}

const fn default_reconnect_delay_ms() -> u64 {
    2000
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Line matching configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ParsingConfig {
    /// Strict token-position matching or compatible substring matching.
    #[serde(default)]
    pub mode: ParseMode,

    /// How reported track numbers map to track entities.
    #[serde(default)]
    pub track_mapping: TrackMapping,
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// Display hand-off configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PublisherConfig {
    /// Changes that may wait for the display.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long ingestion waits for queue space before dropping a change.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
}

impl PublisherConfig {
    /// Send timeout as a [`Duration`].
    pub const fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            send_timeout_ms: default_send_timeout_ms(),
        }
    }
}

const fn default_queue_capacity() -> usize {
    256
}

const fn default_send_timeout_ms() -> u64 {
    250
}

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

/// Observer API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether to serve the observer API at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind address.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

const fn default_true() -> bool {
    true
}

fn default_observer_host() -> String {
    String::from("0.0.0.0")
}

const fn default_observer_port() -> u16 {
    8080
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    String::from("info")
}
