//! Record keys
//!
//! A key is used verbatim as a file basename, so validation is what keeps
//! every record inside the storage root.

use std::fmt;

use crate::error::{DirKvError, Result};

/// A validated record key
///
/// Guarantees:
/// - non-empty, valid UTF-8
/// - no whitespace, no `/`, no `\`, no NUL
/// - not `.` or `..`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);

impl Key {
    /// Validate raw bytes as a key
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let s = std::str::from_utf8(raw)
            .map_err(|_| DirKvError::InvalidKey("key is not valid UTF-8".to_string()))?;
        Self::validate(s)?;
        Ok(Key(s.to_string()))
    }

    /// Check whether `name` could be a record filename
    pub fn is_valid(name: &str) -> bool {
        Self::validate(name).is_ok()
    }

    fn validate(s: &str) -> Result<()> {
        if s.is_empty() {
            return Err(DirKvError::InvalidKey("key is empty".to_string()));
        }
        if s == "." || s == ".." {
            return Err(DirKvError::InvalidKey(format!("key {:?} names a directory", s)));
        }
        if let Some(c) = s
            .chars()
            .find(|c| c.is_whitespace() || matches!(c, '/' | '\\' | '\0'))
        {
            return Err(DirKvError::InvalidKey(format!(
                "key {:?} contains forbidden character {:?}",
                s, c
            )));
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
