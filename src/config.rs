//! Configuration for respkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{KvError, Result};

/// Main configuration for a respkv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Persistence Configuration
    // -------------------------------------------------------------------------
    /// Path of the append-only command log
    pub aof_path: PathBuf,

    /// Whether mutating commands are logged and replayed at startup
    pub appendonly: bool,

    /// How often the background task fsyncs the log
    pub sync_interval: Duration,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aof_path: PathBuf::from("./appendonly.aof"),
            appendonly: true,
            sync_interval: Duration::from_secs(1),
            listen_addr: "127.0.0.1:6379".to_string(),
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.sync_interval.is_zero() {
            return Err(KvError::Config(
                "sync_interval must be greater than zero".to_string(),
            ));
        }
        if self.appendonly && self.aof_path.as_os_str().is_empty() {
            return Err(KvError::Config(
                "aof_path must be set when appendonly is enabled".to_string(),
            ));
        }
        if self.listen_addr.is_empty() {
            return Err(KvError::Config("listen_addr must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the append-only log path
    pub fn aof_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.aof_path = path.into();
        self
    }

    /// Enable or disable the append-only log
    pub fn appendonly(mut self, enabled: bool) -> Self {
        self.config.appendonly = enabled;
        self
    }

    /// Set the background fsync interval
    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.config.sync_interval = interval;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
