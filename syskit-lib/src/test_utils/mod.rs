//! Test utilities for syskit.
//!
//! - [`ScriptedBackend`]: a storage backend whose failures are chosen per
//!   address and which records every call
//! - [`FlakyCatalog`]: an [`InMemoryCatalog`] that rejects inserts, write
//!   streams or read streams on demand
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use syskit_lib::test_utils::ScriptedBackend;
//!
//! let catalog = Arc::new(ScriptedBackend::new("catalog"));
//! catalog.fail_writes_to(StorageAddress::HIDDEN_MODERN);
//! ```

use std::collections::{HashMap, HashSet};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::address::StorageAddress;
use crate::backend::{
    BackendError, BackendResult, CatalogError, CatalogHandle, CatalogRecord, CatalogResult,
    CatalogService, InMemoryCatalog, StorageBackend,
};

#[derive(Default)]
struct Script {
    slots: HashMap<StorageAddress, Vec<u8>>,
    failing_writes: HashSet<StorageAddress>,
    failing_reads: HashSet<StorageAddress>,
    writes: Vec<StorageAddress>,
    reads: Vec<StorageAddress>,
}

/// Backend with per-address failure injection and a call log.
pub struct ScriptedBackend {
    name: &'static str,
    script: Mutex<Script>,
}

impl ScriptedBackend {
    /// Create a backend reporting `name` in logs.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            script: Mutex::new(Script::default()),
        }
    }

    /// Make every write to `address` fail.
    pub fn fail_writes_to(&self, address: StorageAddress) {
        self.script().failing_writes.insert(address);
    }

    /// Make every read from `address` fail.
    pub fn fail_reads_from(&self, address: StorageAddress) {
        self.script().failing_reads.insert(address);
    }

    /// Place raw bytes at `address` without logging a write.
    pub fn seed(&self, address: StorageAddress, bytes: &[u8]) {
        self.script().slots.insert(address, bytes.to_vec());
    }

    /// Raw bytes currently stored at `address`.
    pub fn stored(&self, address: &StorageAddress) -> Option<Vec<u8>> {
        self.script().slots.get(address).cloned()
    }

    /// Addresses of successful writes, in order.
    pub fn write_log(&self) -> Vec<StorageAddress> {
        self.script().writes.clone()
    }

    /// Addresses read (including failed reads), in order.
    pub fn read_log(&self) -> Vec<StorageAddress> {
        self.script().reads.clone()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        lock(&self.script)
    }
}

impl StorageBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn write(&self, address: &StorageAddress, data: &[u8]) -> BackendResult<()> {
        let mut script = self.script();
        if script.failing_writes.contains(address) {
            return Err(BackendError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("scripted write failure at {}", address),
            )));
        }
        script.slots.insert(*address, data.to_vec());
        script.writes.push(*address);
        Ok(())
    }

    fn read(&self, address: &StorageAddress) -> BackendResult<Option<Vec<u8>>> {
        let mut script = self.script();
        script.reads.push(*address);
        if script.failing_reads.contains(address) {
            return Err(BackendError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("scripted read failure at {}", address),
            )));
        }
        Ok(script.slots.get(address).cloned())
    }
}

/// In-memory catalog with switchable failures.
#[derive(Default)]
pub struct FlakyCatalog {
    inner: InMemoryCatalog,
    rejected_paths: Mutex<HashSet<String>>,
    unwritable_paths: Mutex<HashSet<String>>,
    unwritable_handles: Mutex<HashSet<CatalogHandle>>,
    unreadable: AtomicBool,
}

impl FlakyCatalog {
    /// Create an empty catalog with no failures armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject inserts under `relative_path` (matched after normalization).
    pub fn reject_inserts_under(&self, relative_path: &str) {
        lock(&self.rejected_paths).insert(crate::address::normalize_relative_path(relative_path));
    }

    /// Let inserts under `relative_path` succeed but make their write
    /// streams fail on flush, leaving the record empty.
    pub fn break_write_streams_under(&self, relative_path: &str) {
        lock(&self.unwritable_paths).insert(crate::address::normalize_relative_path(relative_path));
    }

    /// Make every `open_read` fail while records stay queryable.
    pub fn break_read_streams(&self) {
        self.unreadable.store(true, Ordering::SeqCst);
    }

    /// The wrapped catalog, for inspection.
    pub fn inner(&self) -> &InMemoryCatalog {
        &self.inner
    }
}

impl CatalogService for FlakyCatalog {
    fn insert(&self, record: &CatalogRecord) -> CatalogResult<CatalogHandle> {
        let path = crate::address::normalize_relative_path(&record.relative_path);
        if lock(&self.rejected_paths).contains(&path) {
            return Err(CatalogError::InsertRejected(format!(
                "directory {} cannot be created",
                path
            )));
        }
        let handle = self.inner.insert(record)?;
        if lock(&self.unwritable_paths).contains(&path) {
            lock(&self.unwritable_handles).insert(handle);
        }
        Ok(handle)
    }

    fn query(&self, relative_path: &str, display_name: &str) -> CatalogResult<Vec<CatalogHandle>> {
        self.inner.query(relative_path, display_name)
    }

    fn open_write(&self, handle: CatalogHandle) -> CatalogResult<Box<dyn Write + Send + '_>> {
        if lock(&self.unwritable_handles).contains(&handle) {
            return Ok(Box::new(FailingWriteStream));
        }
        self.inner.open_write(handle)
    }

    fn open_read(&self, handle: CatalogHandle) -> CatalogResult<Box<dyn Read + Send + '_>> {
        if self.unreadable.load(Ordering::SeqCst) {
            return Err(CatalogError::StreamUnavailable {
                handle,
                reason: "permission revoked".to_string(),
            });
        }
        self.inner.open_read(handle)
    }

    fn delete(&self, handle: CatalogHandle) -> CatalogResult<()> {
        self.inner.delete(handle)
    }
}

/// Accepts bytes and fails when asked to commit them.
struct FailingWriteStream;

impl Write for FailingWriteStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::other("no space left on device"))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
