//! Per-key lock stripes
//!
//! SET and DEL are existence-check-then-act sequences. Holding the stripe
//! for the key across the whole sequence keeps two connections from both
//! seeing "absent" and both creating the record.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use parking_lot::{Mutex, MutexGuard};

use super::Key;

/// Fixed array of mutexes indexed by key hash
///
/// Keys that share a stripe serialize against each other too; that only
/// costs throughput, never correctness.
pub struct KeyLocks {
    stripes: Vec<Mutex<()>>,
}

impl KeyLocks {
    /// Create `count` stripes (at least one)
    pub fn new(count: usize) -> Self {
        let stripes = (0..count.max(1)).map(|_| Mutex::new(())).collect();
        Self { stripes }
    }

    /// Block until the stripe owning `key` is held
    pub fn lock(&self, key: &Key) -> MutexGuard<'_, ()> {
        self.stripes[self.stripe_of(key)].lock()
    }

    /// Index of the stripe owning `key`
    pub fn stripe_of(&self, key: &Key) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }

    /// Number of stripes
    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }
}
