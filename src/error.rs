//! Error types for dirkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::protocol::ParseError;

/// Result type alias using DirKvError
pub type Result<T> = std::result::Result<T, DirKvError>;

/// Unified error type for dirkv operations
#[derive(Debug, Error)]
pub enum DirKvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Key not found")]
    KeyNotFound,

    #[error("Key already exists")]
    KeyExists,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Value too large: {len} bytes (max {max})")]
    ValueTooLarge { len: usize, max: usize },

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Too many tokens in request (max {max})")]
    TooManyTokens { max: usize },

    #[error("Response frame too large: {len} bytes (max {max})")]
    ResponseTooLarge { len: usize, max: usize },

    #[error("Rejected request: {0}")]
    Parse(#[from] ParseError),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DirKvError {
    /// True for I/O errors that just mean the peer went away
    pub fn is_disconnect(&self) -> bool {
        match self {
            DirKvError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }

    /// True for read/write timeouts (unix reports WouldBlock, windows TimedOut)
    pub fn is_timeout(&self) -> bool {
        match self {
            DirKvError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}
