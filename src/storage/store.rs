//! File-per-record store
//!
//! Maps a key to `<root>/<key>` and performs create/read/delete against it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;

use crate::config::Config;
use crate::error::{DirKvError, Result};

use super::Key;

/// Permission bits of the storage root
pub const DIR_MODE: u32 = 0o755;

/// Permission bits of record files
pub const FILE_MODE: u32 = 0o644;

/// Storage layer over one directory
///
/// ## Concurrency:
/// Each method is a handful of independent syscalls. Callers that need
/// check-then-act atomicity (SET, DEL) must hold the key's stripe from
/// `KeyLocks` around the sequence.
pub struct FileStore {
    /// Directory holding the record files
    root: PathBuf,

    /// Largest value accepted on create and returned on read
    max_value_len: usize,

    /// Suffix counter keeping concurrent temp files apart
    temp_seq: AtomicU64,
}

impl FileStore {
    /// Create a store rooted at `root` (nothing is touched on disk)
    pub fn new(root: impl Into<PathBuf>, max_value_len: usize) -> Self {
        Self {
            root: root.into(),
            max_value_len,
            temp_seq: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.storage_root, config.max_value_len)
    }

    /// Create the storage root (and parents) if absent
    ///
    /// Safe to call concurrently and on every request.
    pub fn ensure_root(&self) -> Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(DIR_MODE);
        }
        builder.create(&self.root)?;

        if !self.root.is_dir() {
            return Err(DirKvError::Storage(format!(
                "storage root {} is not a directory",
                self.root.display()
            )));
        }
        Ok(())
    }

    /// Path of the record file for `key`
    pub fn path_for(&self, key: &Key) -> PathBuf {
        self.root.join(key.as_str())
    }

    /// Does a record file exist for `key`?
    ///
    /// Only "not found" maps to `false`; any other failure is an error.
    pub fn exists(&self, key: &Key) -> Result<bool> {
        match fs::metadata(self.path_for(key)) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a new record
    ///
    /// The value goes to a temp file first and is renamed into place, so a
    /// crash never exposes a partially written record.
    pub fn create(&self, key: &Key, value: &[u8]) -> Result<()> {
        if value.len() > self.max_value_len {
            return Err(DirKvError::ValueTooLarge {
                len: value.len(),
                max: self.max_value_len,
            });
        }
        if self.exists(key)? {
            return Err(DirKvError::KeyExists);
        }

        let path = self.path_for(key);
        let temp_path = self.temp_path_for(key);

        let written = Self::write_temp(&temp_path, value)
            .and_then(|()| fs::rename(&temp_path, &path).map_err(DirKvError::from));

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        tracing::trace!("Created record {} ({} bytes)", path.display(), value.len());
        Ok(())
    }

    /// Read a record's value
    pub fn read(&self, key: &Key) -> Result<Bytes> {
        let file = match File::open(self.path_for(key)) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(DirKvError::KeyNotFound),
            Err(e) => return Err(e.into()),
        };

        // One byte past the cap is enough to tell "too large" apart
        let mut value = Vec::with_capacity(self.max_value_len + 1);
        file.take(self.max_value_len as u64 + 1).read_to_end(&mut value)?;

        if value.len() > self.max_value_len {
            return Err(DirKvError::ValueTooLarge {
                len: value.len(),
                max: self.max_value_len,
            });
        }

        Ok(Bytes::from(value))
    }

    /// Remove a record
    pub fn delete(&self, key: &Key) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(DirKvError::KeyNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Count the records in the root (temp files excluded)
    pub fn len(&self) -> Result<usize> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut count = 0;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if entry.file_name().to_str().is_some_and(Key::is_valid) {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Get the storage root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the value size cap
    pub fn max_value_len(&self) -> usize {
        self.max_value_len
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// ".<key>.tmp <pid>.<seq>": the space keeps it from ever being a key
    fn temp_path_for(&self, key: &Key) -> PathBuf {
        let seq = self.temp_seq.fetch_add(1, Ordering::Relaxed);
        self.root
            .join(format!(".{}.tmp {}.{}", key, std::process::id(), seq))
    }

    fn write_temp(path: &Path, value: &[u8]) -> Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(FILE_MODE);
        }

        let mut file = options.open(path)?;
        file.write_all(value)?;
        file.sync_all()?;
        Ok(())
    }
}
