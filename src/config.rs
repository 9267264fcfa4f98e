//! Configuration for dirkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{DirKvError, Result};
use crate::protocol::MIN_REQUEST_LEN;

/// Main configuration for a dirkv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding one file per record
    /// Internal structure:
    ///   {storage_root}/
    ///     ├── <key>                 (record, contents = value bytes)
    ///     └── ".<key>.tmp <pid>.<n>" (in-flight create, renamed onto <key>)
    pub storage_root: PathBuf,

    /// Largest value accepted by SET and returned by GET (bytes)
    pub max_value_len: usize,

    /// Number of mutex stripes serializing per-key check-then-act sequences
    pub lock_stripes: usize,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Request buffer size and maximum size of a single response frame
    pub max_message_len: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Worker threads handling connections (0 = serve serially on the accept thread)
    pub workers: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    /// How long the accept loop sleeps when no connection is pending (milliseconds)
    pub accept_poll_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("./db"),
            max_value_len: 100,
            lock_stripes: 64,
            max_message_len: 128,
            listen_addr: "127.0.0.1:5000".to_string(),
            workers: 0,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            accept_poll_ms: 50,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the limits are consistent with each other
    pub fn validate(&self) -> Result<()> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(DirKvError::Config("storage root must not be empty".to_string()));
        }
        if self.max_message_len < MIN_REQUEST_LEN {
            return Err(DirKvError::Config(format!(
                "max_message_len {} is below the minimum request length {}",
                self.max_message_len, MIN_REQUEST_LEN
            )));
        }
        // "OK\n" is its own frame, the payload frame is value + '\n'
        if self.max_value_len + 4 > self.max_message_len {
            return Err(DirKvError::Config(format!(
                "max_value_len {} does not fit in a {} byte response frame",
                self.max_value_len, self.max_message_len
            )));
        }
        if self.lock_stripes == 0 {
            return Err(DirKvError::Config("lock_stripes must be at least 1".to_string()));
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
    /// Set the storage root directory
    pub fn storage_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage_root = path.into();
        self
    }

    /// Set the maximum value length (in bytes)
    pub fn max_value_len(mut self, len: usize) -> Self {
        self.config.max_value_len = len;
        self
    }

    /// Set the number of key lock stripes
    pub fn lock_stripes(mut self, count: usize) -> Self {
        self.config.lock_stripes = count;
        self
    }

    /// Set the request buffer / response frame size (in bytes)
    pub fn max_message_len(mut self, len: usize) -> Self {
        self.config.max_message_len = len;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of worker threads (0 = serial)
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
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

    /// Set the idle sleep of the accept loop (in milliseconds)
    pub fn accept_poll_ms(mut self, ms: u64) -> Self {
        self.config.accept_poll_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
