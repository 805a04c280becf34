//! # Configuration Management
//!
//! Plain configuration for the socket server and its logging.
//!
//! Hooks, handlers and the frame-length collaborator are code, not data, so
//! they are attached through [`crate::transport::server::ServerBuilder`]
//! instead. Everything here is serializable and read-only once the server
//! starts.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - TOML strings via `from_toml()`
//! - Environment variables via `from_env()`
//! - Direct instantiation with defaults

use crate::core::opcode::OpcodeWidth;
use crate::error::constants::{ERR_EMPTY_ADDRESS, ERR_HEADER_SIZE, ERR_ZERO_FRAME_LIMIT};
use crate::error::{Result, ServerError};
use crate::utils::timeout;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default bind address
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Default bind port
pub const DEFAULT_PORT: u16 = 5000;

/// Default number of header bytes read before the body length is known
pub const DEFAULT_HEADER_SIZE: usize = 4;

/// Largest accepted header
pub const MAX_HEADER_SIZE: usize = 64;

/// Default ceiling on a single frame body
pub const DEFAULT_MAX_FRAME_LENGTH: usize = u16::MAX as usize;

/// Top-level configuration file layout
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SocketConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SocketConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ServerError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ServerError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Validate every section. Empty list means the configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.server.validate();
        errors.extend(self.logging.validate());
        errors
    }
}

/// Server bind and framing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0")
    pub address: String,

    /// Listen port
    pub port: u16,

    /// Bytes consumed before the frame length is computed
    pub header_size: usize,

    /// Deadline for one socket read; expiry just re-polls
    #[serde(with = "duration_serde")]
    pub read_timeout: Duration,

    /// Largest body a header may announce before the session is dropped
    pub max_frame_length: usize,

    /// How long to wait for sessions to finish after shutdown
    #[serde(with = "duration_serde")]
    pub shutdown_timeout: Duration,

    /// Expected opcode width, checked against the server's opcode type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opcode_width: Option<OpcodeWidth>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: String::from(DEFAULT_ADDRESS),
            port: DEFAULT_PORT,
            header_size: DEFAULT_HEADER_SIZE,
            read_timeout: timeout::READ_TIMEOUT,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            shutdown_timeout: timeout::SHUTDOWN_TIMEOUT,
            opcode_width: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ServerError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables, on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("OPCODE_SOCKET_ADDRESS") {
            config.address = addr;
        }

        if let Ok(port) = std::env::var("OPCODE_SOCKET_PORT") {
            config.port = parse_env_value(&port, "port")?;
        }

        if let Ok(size) = std::env::var("OPCODE_SOCKET_HEADER_SIZE") {
            config.header_size = parse_env_value(&size, "header size")?;
        }

        if let Ok(timeout) = std::env::var("OPCODE_SOCKET_READ_TIMEOUT_MS") {
            config.read_timeout = Duration::from_millis(parse_env_value(&timeout, "read timeout")?);
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// `address:port`, as passed to the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Validate server configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        // Hostnames are resolved by the listener at bind time.
        if self.address.trim().is_empty() {
            errors.push(ERR_EMPTY_ADDRESS.to_string());
        }

        if self.header_size == 0 || self.header_size > MAX_HEADER_SIZE {
            errors.push(ERR_HEADER_SIZE.to_string());
        }

        if self.read_timeout.as_millis() < 10 {
            errors.push("Read timeout too short (minimum: 10ms)".to_string());
        } else if self.read_timeout.as_secs() > 300 {
            errors.push("Read timeout too long (maximum: 300s)".to_string());
        }

        if self.max_frame_length == 0 {
            errors.push(ERR_ZERO_FRAME_LIMIT.to_string());
        } else if self.max_frame_length > 16 * 1024 * 1024 {
            errors.push(format!(
                "Max frame length too large: {} bytes (maximum recommended: 16 MB)",
                self.max_frame_length
            ));
        }

        if self.shutdown_timeout.as_secs() > 60 {
            errors.push("Shutdown timeout too long (maximum: 60s)".to_string());
        }

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServerError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "opcode_socket=debug"
    pub level: String,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,

    /// Whether to print the module path of each event
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            json_format: false,
            show_target: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.level.trim().is_empty() {
            errors.push("Log level cannot be empty".to_string());
        }
        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Parse one environment override, naming the setting in the error.
fn parse_env_value<T>(raw: &str, setting: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ServerError::ConfigError(format!("Invalid {setting} '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.address, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.header_size, 4);
        assert_eq!(config.read_timeout, Duration::from_secs(5));
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ServerConfig::from_toml("port = 8484\nopcode_width = \"narrow\"").unwrap();
        assert_eq!(config.port, 8484);
        assert_eq!(config.header_size, DEFAULT_HEADER_SIZE);
        assert_eq!(config.opcode_width, Some(OpcodeWidth::Narrow));
    }

    #[test]
    fn test_example_config_parses_back() {
        let text = SocketConfig::example_config();
        let parsed = SocketConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.server.port, DEFAULT_PORT);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_env_values_parse() {
        assert_eq!(parse_env_value::<u16>("8484", "port").unwrap(), 8484);
        assert_eq!(parse_env_value::<u64>(" 250 ", "read timeout").unwrap(), 250);
    }

    #[test]
    fn test_invalid_env_value_is_config_error() {
        let err = parse_env_value::<u64>("5s", "read timeout").unwrap_err();
        match err {
            ServerError::ConfigError(msg) => assert!(msg.contains("Invalid read timeout '5s'")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
