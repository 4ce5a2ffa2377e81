//! Configuration management for the RAX chat node
//!
//! Settings come from an optional `config.toml`, then `RAX_CHAT_*` environment
//! variables. Anything left unset falls back to [`NodeConfig::default`].

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Maximum number of history entries kept before the oldest are evicted.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Number of entries shown by `/history`.
pub const DEFAULT_HISTORY_DISPLAY_COUNT: usize = 20;

/// Longest line accepted from a peer, in bytes, before the link is dropped.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8192;

/// Complete node configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NodeConfig {
    /// Nickname used in hello lines and outgoing chat lines
    /// Environment: RAX_CHAT_USERNAME
    pub username: String,

    /// IP address the listening socket binds to
    pub bind_address: String,

    /// Listening port; `0` binds an ephemeral port
    /// Environment: RAX_CHAT_PORT
    pub port: u16,

    /// Upper bound on a single outbound connect attempt
    pub connect_timeout_secs: u64,

    /// Upper bound on writing one line to one peer; a slower peer is dropped
    pub write_timeout_secs: u64,

    /// Longest line accepted from a peer, excluding the line terminator
    pub max_line_length: usize,

    pub history_capacity: usize,
    pub history_display_count: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            bind_address: "0.0.0.0".to_string(),
            port: 0,
            connect_timeout_secs: 10,
            write_timeout_secs: 5,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            history_display_count: DEFAULT_HISTORY_DISPLAY_COUNT,
        }
    }
}

impl NodeConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        // Packaged layout first, then the working directory
        let settings = Config::builder()
            .add_source(File::with_name("rax-chat/config").required(false))
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("RAX_CHAT"))
            .build()?;

        let config: NodeConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from one explicit file, without environment overrides
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let settings = Config::builder().add_source(File::from(path)).build()?;

        let config: NodeConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.connect_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.write_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "write_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.max_line_length == 0 {
            return Err(config::ConfigError::Message(
                "max_line_length must be greater than 0".into(),
            ));
        }

        if self.history_capacity == 0 {
            return Err(config::ConfigError::Message(
                "history_capacity must be greater than 0".into(),
            ));
        }

        if self.history_display_count == 0 {
            return Err(config::ConfigError::Message(
                "history_display_count must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as a listening socket string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get connect timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Get per-peer write timeout as Duration
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}
