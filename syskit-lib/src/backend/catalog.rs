//! Catalog backend.
//!
//! On tiers where shared storage is mediated, files are records in a host
//! catalog (MediaStore on Android) addressed by relative path and display
//! name. Writing inserts a record and streams bytes into it; reading queries
//! for `{relative path, display name}` and streams the first match out.

use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, RwLock};

use super::{strip_trailing_line_separator, BackendResult, StorageBackend};
use crate::address::{normalize_relative_path, StorageAddress};

/// Media type given to every record. Generic binary keeps the catalog from
/// treating the slot as a document it can index or preview.
pub const GENERIC_BINARY_MEDIA_TYPE: &str = "application/octet-stream";

/// Opaque identifier of a catalog record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogHandle(pub u64);

/// Attributes of a catalog record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogRecord {
    /// File name shown by the catalog.
    pub display_name: String,
    /// MIME type.
    pub media_type: String,
    /// Directory relative to the shared storage root, with trailing slash.
    pub relative_path: String,
}

impl CatalogRecord {
    /// Record describing the slot at `address`.
    pub fn for_address(address: &StorageAddress) -> Self {
        Self {
            display_name: address.slot_name.to_string(),
            media_type: GENERIC_BINARY_MEDIA_TYPE.to_string(),
            relative_path: address.relative_path(),
        }
    }

    /// Whether this record sits at `{relative_path, display_name}`.
    ///
    /// The path is compared after trailing-slash normalization.
    pub fn matches(&self, relative_path: &str, display_name: &str) -> bool {
        self.display_name == display_name
            && normalize_relative_path(&self.relative_path)
                == normalize_relative_path(relative_path)
    }
}

/// Error type for catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog rejected insert: {0}")]
    InsertRejected(String),
    #[error("catalog query failed: {0}")]
    Query(String),
    #[error("catalog delete failed: {0}")]
    Delete(String),
    #[error("record {0:?} not found")]
    NotFound(CatalogHandle),
    #[error("could not open stream for record {handle:?}: {reason}")]
    StreamUnavailable {
        handle: CatalogHandle,
        reason: String,
    },
    #[error("catalog does not support {0}")]
    Unsupported(&'static str),
    #[error("catalog lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Host catalog service.
///
/// Implemented by the platform (see `syskit-mobile`) or by
/// [`InMemoryCatalog`] for tests.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (Send + Sync).
pub trait CatalogService: Send + Sync {
    /// Create a new record. Always creates; never updates an existing one.
    fn insert(&self, record: &CatalogRecord) -> CatalogResult<CatalogHandle>;

    /// Find records at `{relative_path, display_name}`.
    ///
    /// # Returns
    ///
    /// Zero or more handles, oldest first where the catalog knows the order.
    fn query(&self, relative_path: &str, display_name: &str) -> CatalogResult<Vec<CatalogHandle>>;

    /// Open a record for writing. The record's contents are replaced by what
    /// is written once the stream is flushed.
    fn open_write(&self, handle: CatalogHandle) -> CatalogResult<Box<dyn Write + Send + '_>>;

    /// Open a record for reading.
    fn open_read(&self, handle: CatalogHandle) -> CatalogResult<Box<dyn Read + Send + '_>>;

    /// Remove a record.
    fn delete(&self, handle: CatalogHandle) -> CatalogResult<()> {
        let _ = handle;
        Err(CatalogError::Unsupported("delete"))
    }
}

/// [`StorageBackend`] over a [`CatalogService`].
pub struct CatalogBackend {
    catalog: Arc<dyn CatalogService>,
    replace_existing: bool,
}

impl CatalogBackend {
    /// Create a backend that removes earlier records at an address once a
    /// new one has been written.
    ///
    /// Reads take the first matching record, so without the removal a
    /// second save would be shadowed by the first.
    pub fn new(catalog: Arc<dyn CatalogService>) -> Self {
        Self {
            catalog,
            replace_existing: true,
        }
    }

    /// Create a backend that always inserts a fresh record and leaves older
    /// ones in place.
    pub fn appending(catalog: Arc<dyn CatalogService>) -> Self {
        Self {
            catalog,
            replace_existing: false,
        }
    }

    /// Whether earlier records are removed after a successful write.
    pub fn replaces_existing(&self) -> bool {
        self.replace_existing
    }

    /// The underlying catalog service.
    pub fn catalog(&self) -> &Arc<dyn CatalogService> {
        &self.catalog
    }

    /// Stream `data` into a freshly inserted record.
    fn fill(&self, handle: CatalogHandle, data: &[u8]) -> BackendResult<()> {
        let mut stream = self.catalog.open_write(handle)?;
        stream.write_all(data)?;
        stream.flush()?;
        Ok(())
    }

    /// Remove a record whose contents never landed.
    fn discard(&self, handle: CatalogHandle) {
        if let Err(e) = self.catalog.delete(handle) {
            tracing::warn!(?handle, error = %e, "could not remove partially written record");
        }
    }

    /// Remove every record at the address of `record` except `keep`.
    fn remove_superseded(&self, record: &CatalogRecord, keep: CatalogHandle) {
        let handles = match self.catalog.query(&record.relative_path, &record.display_name) {
            Ok(handles) => handles,
            Err(e) => {
                tracing::warn!(
                    relative_path = %record.relative_path,
                    display_name = %record.display_name,
                    error = %e,
                    "could not look up superseded records"
                );
                return;
            }
        };
        for handle in handles.into_iter().filter(|h| *h != keep) {
            if let Err(e) = self.catalog.delete(handle) {
                tracing::warn!(?handle, error = %e, "could not remove superseded record");
            }
        }
    }
}

impl StorageBackend for CatalogBackend {
    fn name(&self) -> &'static str {
        "catalog"
    }

    fn write(&self, address: &StorageAddress, data: &[u8]) -> BackendResult<()> {
        let record = CatalogRecord::for_address(address);
        let handle = self.catalog.insert(&record)?;
        if let Err(e) = self.fill(handle, data) {
            self.discard(handle);
            return Err(e);
        }
        // Earlier records go only once the new one holds the payload.
        if self.replace_existing {
            self.remove_superseded(&record, handle);
        }

        tracing::debug!(
            relative_path = %record.relative_path,
            display_name = %record.display_name,
            ?handle,
            bytes = data.len(),
            "wrote catalog record"
        );
        Ok(())
    }

    fn read(&self, address: &StorageAddress) -> BackendResult<Option<Vec<u8>>> {
        let relative_path = address.relative_path();
        let handles = self.catalog.query(&relative_path, address.slot_name)?;
        let Some(&handle) = handles.first() else {
            tracing::debug!(%relative_path, display_name = address.slot_name, "no matching record");
            return Ok(None);
        };
        if handles.len() > 1 {
            tracing::debug!(count = handles.len(), "multiple records match, using the first");
        }

        let mut stream = match self.catalog.open_read(handle) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(?handle, error = %e, "record found but not readable");
                return Ok(None);
            }
        };
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;
        Ok(Some(strip_trailing_line_separator(bytes)))
    }
}

/// One record of the in-memory catalog.
#[derive(Clone, Debug)]
struct StoredRecord {
    record: CatalogRecord,
    data: Vec<u8>,
}

#[derive(Default)]
struct CatalogState {
    next_id: u64,
    order: Vec<CatalogHandle>,
    records: HashMap<CatalogHandle, StoredRecord>,
}

/// In-memory catalog service.
///
/// **Warning**: This is for testing and development only. Records are lost
/// when the process exits.
///
/// Duplicate records at the same address are allowed, and `query` returns
/// handles in insertion order.
#[derive(Default)]
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    ///
    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.records.len()).unwrap_or(0)
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every record with its contents, in insertion order.
    pub fn records(&self) -> Vec<(CatalogRecord, Vec<u8>)> {
        let Ok(state) = self.state.read() else {
            return Vec::new();
        };
        state
            .order
            .iter()
            .filter_map(|h| state.records.get(h))
            .map(|r| (r.record.clone(), r.data.clone()))
            .collect()
    }

    fn commit(&self, handle: CatalogHandle, data: &[u8]) -> io::Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| io::Error::other("catalog lock poisoned during write"))?;
        let stored = state
            .records
            .get_mut(&handle)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "record was deleted"))?;
        stored.data = data.to_vec();
        Ok(())
    }
}

impl CatalogService for InMemoryCatalog {
    fn insert(&self, record: &CatalogRecord) -> CatalogResult<CatalogHandle> {
        let mut state = self
            .state
            .write()
            .map_err(|_| CatalogError::LockPoisoned("insert"))?;
        state.next_id += 1;
        let handle = CatalogHandle(state.next_id);
        let mut record = record.clone();
        record.relative_path = normalize_relative_path(&record.relative_path);
        state.order.push(handle);
        state.records.insert(
            handle,
            StoredRecord {
                record,
                data: Vec::new(),
            },
        );
        Ok(handle)
    }

    fn query(&self, relative_path: &str, display_name: &str) -> CatalogResult<Vec<CatalogHandle>> {
        let state = self
            .state
            .read()
            .map_err(|_| CatalogError::LockPoisoned("query"))?;
        Ok(state
            .order
            .iter()
            .filter(|h| {
                state
                    .records
                    .get(*h)
                    .is_some_and(|r| r.record.matches(relative_path, display_name))
            })
            .copied()
            .collect())
    }

    fn open_write(&self, handle: CatalogHandle) -> CatalogResult<Box<dyn Write + Send + '_>> {
        let state = self
            .state
            .read()
            .map_err(|_| CatalogError::LockPoisoned("open_write"))?;
        if !state.records.contains_key(&handle) {
            return Err(CatalogError::NotFound(handle));
        }
        Ok(Box::new(MemoryWriteStream {
            catalog: self,
            handle,
            buffer: Vec::new(),
        }))
    }

    fn open_read(&self, handle: CatalogHandle) -> CatalogResult<Box<dyn Read + Send + '_>> {
        let state = self
            .state
            .read()
            .map_err(|_| CatalogError::LockPoisoned("open_read"))?;
        let stored = state
            .records
            .get(&handle)
            .ok_or(CatalogError::NotFound(handle))?;
        Ok(Box::new(Cursor::new(stored.data.clone())))
    }

    fn delete(&self, handle: CatalogHandle) -> CatalogResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| CatalogError::LockPoisoned("delete"))?;
        if state.records.remove(&handle).is_none() {
            return Err(CatalogError::NotFound(handle));
        }
        state.order.retain(|h| *h != handle);
        Ok(())
    }
}

/// Buffered write stream; contents land in the catalog on flush.
struct MemoryWriteStream<'a> {
    catalog: &'a InMemoryCatalog,
    handle: CatalogHandle,
    buffer: Vec<u8>,
}

impl Write for MemoryWriteStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.catalog.commit(self.handle, &self.buffer)
    }
}
