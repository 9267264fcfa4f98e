//! Storage Module
//!
//! Persistent storage layer: one file per record.
//!
//! ## Responsibilities
//! - Validate keys so every record stays inside the storage root
//! - Create/read/delete records with existence checks
//! - Atomic record creation (temp file + rename)
//! - Per-key serialization for check-then-act sequences
//!
//! ## On-disk Layout
//! ```text
//! {storage_root}/            (mode 0755)
//! ├── manzana                (mode 0644, contents: "apple")
//! ├── perro                  (mode 0644, contents: "dog")
//! └── ".hola.tmp 4242.7"     (create in progress, renamed onto "hola")
//! ```
//!
//! No header, no length prefix: a record file holds exactly the value bytes.

mod key;
mod locks;
mod store;

pub use key::Key;
pub use locks::KeyLocks;
pub use store::{FileStore, DIR_MODE, FILE_MODE};
