//! # Configuration Management
//!
//! Wire constants of the query protocol plus the runtime configuration for the
//! optional UDP listener and logging setup.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - TOML strings via `from_toml()`
//! - Environment variables via `from_env()`
//! - Direct instantiation with defaults
//!
//! The packet handler itself takes no configuration: everything that affects the
//! bytes on the wire is a constant below.

use crate::error::{constants, QueryError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Prefix clients put in front of every request. The transport strips it before
/// the packet handler sees the datagram; responses never carry it.
pub const QUERY_MAGIC: [u8; 2] = [0xFE, 0xFD];

/// Request/response kind byte for the challenge handshake
pub const KIND_HANDSHAKE: u8 = 0x09;

/// Request/response kind byte for the information (full stat) exchange
pub const KIND_INFORMATION: u8 = 0x00;

/// Width of the zero-padded decimal token field in a handshake response
pub const TOKEN_FIELD_LEN: usize = 12;

/// Length of the process-lifetime token secret
pub const SECRET_LEN: usize = 16;

/// Offset of the token bytes within the SHA-512 digest
pub const TOKEN_DIGEST_OFFSET: usize = 7;

/// Trailing bytes of an information request that carry no meaning for us
pub const INFORMATION_PADDING_LEN: usize = 4;

/// Split number literal written before the key/value section
pub const SPLIT_NUM: [u8; 9] = *b"SPLITNUM\0";

/// Packet count marker following the split number. Always one packet.
pub const PACKET_COUNT_MARKER: u8 = 0x80;

/// Key that opens the player section of an information response
pub const PLAYER_KEY: [u8; 10] = [0x00, 0x01, b'p', b'l', b'a', b'y', b'e', b'r', b'_', 0x00];

/// Largest UDP payload that fits an Ethernet MTU without fragmentation
pub const DEFAULT_MAX_DATAGRAM_SIZE: usize = 1472;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct QueryConfig {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl QueryConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| QueryError::Config(format!("{}: {e}", constants::ERR_CONFIG_OPEN)))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| QueryError::Config(format!("{}: {e}", constants::ERR_CONFIG_READ)))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| QueryError::Config(format!("{}: {e}", constants::ERR_CONFIG_PARSE)))
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("GS4_QUERY_ADDRESS") {
            config.server.address = addr;
        }

        if let Ok(size) = std::env::var("GS4_QUERY_MAX_DATAGRAM") {
            config.server.max_datagram_size = size.parse::<usize>().map_err(|e| {
                QueryError::Config(format!("Invalid GS4_QUERY_MAX_DATAGRAM '{size}': {e}"))
            })?;
        }

        if let Ok(level) = std::env::var("GS4_QUERY_LOG_LEVEL") {
            config.logging.log_level = level.parse::<Level>().map_err(|_| {
                QueryError::Config(format!("Invalid GS4_QUERY_LOG_LEVEL '{level}'"))
            })?;
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

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            QueryError::Config(format!("{}: {e}", constants::ERR_CONFIG_SERIALIZE))
        })?;

        std::fs::write(path, content)
            .map_err(|e| QueryError::Config(format!("{}: {e}", constants::ERR_CONFIG_WRITE)))?;

        Ok(())
    }

    /// Validate the configuration
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(QueryError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// UDP listen address (e.g., "0.0.0.0:19132")
    pub address: String,

    /// Size of the receive buffer; longer datagrams are truncated by the OS
    pub max_datagram_size: usize,

    /// Drop datagrams that do not start with `QUERY_MAGIC`
    pub require_magic: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: String::from("0.0.0.0:19132"),
            max_datagram_size: DEFAULT_MAX_DATAGRAM_SIZE,
            require_magic: true,
        }
    }
}

impl ServerConfig {
    /// Validate listener configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.address.is_empty() {
            errors.push("Server address cannot be empty".to_string());
        } else if self.address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "Invalid server address format: '{}' (expected format: '0.0.0.0:19132')",
                self.address
            ));
        }

        // Smallest useful datagram is magic + an information request
        let min = QUERY_MAGIC.len() + 1 + 4 + 4 + INFORMATION_PADDING_LEN;
        if self.max_datagram_size < min {
            errors.push(format!(
                "Max datagram size too small: {} (minimum: {min})",
                self.max_datagram_size
            ));
        } else if self.max_datagram_size > 65_507 {
            errors.push(format!(
                "Max datagram size too large: {} (maximum UDP payload: 65507)",
                self.max_datagram_size
            ));
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level, overridden by `RUST_LOG` when set
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("gs4-query"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
