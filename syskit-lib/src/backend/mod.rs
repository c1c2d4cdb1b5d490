//! Storage backend abstraction.
//!
//! A backend is a stateless capability: it writes bytes to an address and
//! reads them back. Two production variants exist:
//!
//! - [`DirectPathBackend`]: raw file access under the external storage root
//! - [`CatalogBackend`]: insert/query access through a host catalog service
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 PersistenceCoordinator                   │
//! │        (selector order, codec, first success wins)       │
//! └───────────────┬──────────────────────────┬───────────────┘
//!                 ▼                          ▼
//!      ┌────────────────────┐     ┌────────────────────┐
//!      │ DirectPathBackend  │     │   CatalogBackend   │
//!      │   std::fs paths    │     │  CatalogService    │
//!      └────────────────────┘     └─────────┬──────────┘
//!                                           ▼
//!                                 host catalog (MediaStore)
//! ```
//!
//! # Thread Safety
//!
//! Implementations must be `Send + Sync`. Backends provide no isolation
//! between concurrent writers to the same address.

mod catalog;
mod direct;
mod memory;

pub use catalog::{
    CatalogBackend, CatalogError, CatalogHandle, CatalogRecord, CatalogResult, CatalogService,
    InMemoryCatalog, GENERIC_BINARY_MEDIA_TYPE,
};
pub use direct::DirectPathBackend;
pub use memory::InMemoryBackend;

use std::path::PathBuf;

use crate::address::StorageAddress;

/// Error type for backend operations.
///
/// Every variant is recovered by the coordinator by moving on to the next
/// candidate.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to create directory {}: {source}", .path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// A place a payload can be written to and read from.
pub trait StorageBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Store `data` at `address`, replacing what the backend considers the
    /// current value there.
    ///
    /// # Errors
    ///
    /// Any failure, including partial writes, is an error. A write that
    /// returns `Ok` has been flushed.
    fn write(&self, address: &StorageAddress, data: &[u8]) -> BackendResult<()>;

    /// Read the bytes stored at `address`.
    ///
    /// # Returns
    ///
    /// `None` if nothing is stored there.
    fn read(&self, address: &StorageAddress) -> BackendResult<Option<Vec<u8>>>;
}

/// Drop exactly one trailing line separator (`\n` or `\r\n`).
///
/// Stored payloads never contain newlines; a trailing one was added by an
/// editor or a line-oriented writer and is not part of the value.
pub fn strip_trailing_line_separator(mut bytes: Vec<u8>) -> Vec<u8> {
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
    }
    bytes
}
