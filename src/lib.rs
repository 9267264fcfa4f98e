//! # dirkv
//!
//! A minimal key-value store with:
//! - One file per record (`<storage_root>/<key>` holds the value bytes)
//! - Atomic record creation (temp file + rename)
//! - A line-oriented TCP protocol, one request per connection
//! - Serial serving by default, optional worker pool with per-key locking
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │            (accept loop, one request per connection)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Connection                               │
//! │     read ─► tokenize/parse ─► execute ─► respond ─► close    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │               (per-key lock stripes)                         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌──────────────┐
//!               │  FileStore   │
//!               │ (dir of files)│
//!               └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod network;
pub mod protocol;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DirKvError, Result};
pub use config::Config;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of dirkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
