//! In-memory storage backend.
//!
//! This implementation is for testing and development only.
//!
//! # Thread Safety
//!
//! Uses `RwLock` for thread-safe access. Lock poisoning is reported as a
//! backend error rather than panicking.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{BackendError, BackendResult, StorageBackend};
use crate::address::StorageAddress;

/// Address-keyed in-memory backend.
///
/// **Warning**: Contents are lost when the process exits.
#[derive(Default)]
pub struct InMemoryBackend {
    slots: RwLock<HashMap<StorageAddress, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots.
    ///
    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.slots.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Check if no slot is occupied.
    ///
    /// Returns true if the lock is poisoned.
    pub fn is_empty(&self) -> bool {
        self.slots.read().map(|s| s.is_empty()).unwrap_or(true)
    }

    /// Check whether `address` holds a value.
    pub fn contains(&self, address: &StorageAddress) -> bool {
        self.slots
            .read()
            .map(|s| s.contains_key(address))
            .unwrap_or(false)
    }
}

impl StorageBackend for InMemoryBackend {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    fn write(&self, address: &StorageAddress, data: &[u8]) -> BackendResult<()> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| BackendError::LockPoisoned("write"))?;
        slots.insert(*address, data.to_vec());
        Ok(())
    }

    fn read(&self, address: &StorageAddress) -> BackendResult<Option<Vec<u8>>> {
        let slots = self
            .slots
            .read()
            .map_err(|_| BackendError::LockPoisoned("read"))?;
        Ok(slots.get(address).cloned())
    }
}
