//! Engine Module
//!
//! Executes parsed commands against the file store.
//!
//! ## Responsibilities
//! - Bootstrap the storage root before storage access
//! - Serialize existence-check-then-act sequences per key
//! - Turn storage outcomes into protocol responses
//! - Keep unexpected storage failures scoped to one request

use std::path::Path;

use bytes::Bytes;

use crate::config::Config;
use crate::error::{DirKvError, Result};
use crate::protocol::{Command, ParseError, Response};
use crate::storage::{FileStore, Key, KeyLocks};

/// The command executor
///
/// ## Concurrency Model
///
/// - **SET / DEL**: hold the key's stripe from `KeyLocks` across
///   exists → create/remove, so at most one SET of a key ever succeeds
/// - **GET**: lock-free; a record is either absent or complete (creates
///   go through rename), and a delete racing the read reports NOTFOUND
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Record files
    store: FileStore,

    /// Serializes check-then-act per key
    locks: KeyLocks,
}

impl Engine {
    /// Open an engine with the given config
    ///
    /// Validates the config and creates the storage root if absent.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let store = FileStore::from_config(&config);
        store.ensure_root()?;

        tracing::info!(
            "Storage root {} ready ({} records)",
            store.root().display(),
            store.len()?
        );

        let locks = KeyLocks::new(config.lock_stripes);

        Ok(Self {
            config,
            store,
            locks,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified storage root
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().storage_root(path).build();
        Self::open(config)
    }

    /// Execute a command
    ///
    /// Never fails: expected outcomes and storage errors alike become a
    /// response.
    pub fn execute(&self, command: Command) -> Response {
        match command {
            Command::Set { key, value } => match self.set(&key, &value) {
                Ok(()) => Response::ok(None),
                Err(DirKvError::KeyExists) => Response::already_set(),
                Err(e) => self.failure("SET", &key, e),
            },
            Command::Get { key } => match self.get(&key) {
                Ok(value) => Response::ok(Some(value)),
                Err(DirKvError::KeyNotFound) => Response::not_found(),
                Err(e) => self.failure("GET", &key, e),
            },
            Command::Del { key } => match self.delete(&key) {
                Ok(()) => Response::ok(None),
                Err(DirKvError::KeyNotFound) => Response::not_found(),
                Err(e) => self.failure("DEL", &key, e),
            },
        }
    }

    /// Create a record; `KeyExists` if already set
    pub fn set(&self, key: &Key, value: &[u8]) -> Result<()> {
        self.store.ensure_root()?;

        let _guard = self.locks.lock(key);
        if self.store.exists(key)? {
            return Err(DirKvError::KeyExists);
        }
        self.store.create(key, value)
    }

    /// Read a record; `KeyNotFound` if absent
    pub fn get(&self, key: &Key) -> Result<Bytes> {
        self.store.ensure_root()?;

        if !self.store.exists(key)? {
            return Err(DirKvError::KeyNotFound);
        }
        self.store.read(key)
    }

    /// Remove a record; `KeyNotFound` if absent
    pub fn delete(&self, key: &Key) -> Result<()> {
        self.store.ensure_root()?;

        let _guard = self.locks.lock(key);
        if !self.store.exists(key)? {
            return Err(DirKvError::KeyNotFound);
        }
        self.store.delete(key)
    }

    fn failure(&self, op: &str, key: &Key, err: DirKvError) -> Response {
        match err {
            DirKvError::ValueTooLarge { len, max } => {
                tracing::warn!("{} {}: value of {} bytes exceeds cap {}", op, key, len, max);
                Response::from_parse_error(&ParseError::ValueTooLarge { len, max })
            }
            e => {
                tracing::error!("{} {} failed: {}", op, key, e);
                Response::internal_error()
            }
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the storage root path
    pub fn storage_root(&self) -> &Path {
        self.store.root()
    }

    /// Get the value size cap
    pub fn max_value_len(&self) -> usize {
        self.config.max_value_len
    }

    /// Get the number of records on disk
    pub fn record_count(&self) -> Result<usize> {
        self.store.len()
    }

    /// Get the underlying store
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
