//! Catalog FFI Wrappers
//!
//! On Android 11 and later the payload lives in a MediaStore record. The
//! app implements [`CatalogCallback`] over its `ContentResolver` and hands it
//! to `ExternalStorageFFI::new`:
//!
//! ```kotlin
//! // Kotlin example
//! class MediaStoreCatalog(private val resolver: ContentResolver) : CatalogCallback {
//!     override fun insert(
//!         displayName: String,
//!         mediaType: String,
//!         relativePath: String,
//!     ): CatalogInsertResult {
//!         val values = ContentValues().apply {
//!             put(MediaStore.MediaColumns.DISPLAY_NAME, displayName)
//!             put(MediaStore.MediaColumns.MIME_TYPE, mediaType)
//!             put(MediaStore.MediaColumns.RELATIVE_PATH, relativePath)
//!         }
//!         val uri = resolver.insert(MediaStore.Files.getContentUri("external"), values)
//!             ?: return CatalogInsertResult(false, null, "insert returned null")
//!         return CatalogInsertResult(true, ContentUris.parseId(uri).toULong(), null)
//!     }
//!     // ... query, write, read, delete
//! }
//! ```
//!
//! Record handles cross the boundary as the numeric row id.

use std::io::{self, Cursor, Read, Write};

use syskit_lib::backend::{
    CatalogError, CatalogHandle, CatalogRecord, CatalogResult, CatalogService,
};

// ============================================================================
// Callback Results
// ============================================================================

/// Result type for catalog operations without a payload.
#[derive(Clone, Debug, uniffi::Record)]
pub struct CatalogOperationResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// Error message if failed
    pub error: Option<String>,
}

impl CatalogOperationResult {
    /// Create a success result.
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// Create an error result.
    pub fn err(message: String) -> Self {
        Self {
            success: false,
            error: Some(message),
        }
    }
}

/// Result type for record inserts.
#[derive(Clone, Debug, uniffi::Record)]
pub struct CatalogInsertResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// Row id of the new record
    pub handle: Option<u64>,
    /// Error message if failed
    pub error: Option<String>,
}

impl CatalogInsertResult {
    /// Create a success result.
    pub fn ok(handle: u64) -> Self {
        Self {
            success: true,
            handle: Some(handle),
            error: None,
        }
    }

    /// Create an error result.
    pub fn err(message: String) -> Self {
        Self {
            success: false,
            handle: None,
            error: Some(message),
        }
    }
}

/// Result type for record queries.
#[derive(Clone, Debug, uniffi::Record)]
pub struct CatalogQueryResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// Matching row ids, oldest first
    pub handles: Vec<u64>,
    /// Error message if failed
    pub error: Option<String>,
}

impl CatalogQueryResult {
    /// Create a success result.
    pub fn ok(handles: Vec<u64>) -> Self {
        Self {
            success: true,
            handles,
            error: None,
        }
    }

    /// Create an error result.
    pub fn err(message: String) -> Self {
        Self {
            success: false,
            handles: Vec::new(),
            error: Some(message),
        }
    }
}

/// Result type for record reads.
#[derive(Clone, Debug, uniffi::Record)]
pub struct CatalogReadResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// Record contents. `None` when the platform returned no stream.
    pub data: Option<Vec<u8>>,
    /// Error message if failed
    pub error: Option<String>,
}

impl CatalogReadResult {
    /// Create a success result.
    pub fn ok(data: Option<Vec<u8>>) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    /// Create an error result.
    pub fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

// ============================================================================
// Callback Interface
// ============================================================================

/// Callback interface for the host catalog service.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (Send + Sync).
#[uniffi::export(callback_interface)]
pub trait CatalogCallback: Send + Sync {
    /// Create a new record. Must never update an existing one.
    ///
    /// # Arguments
    ///
    /// * `display_name` - File name of the record (e.g., "sysdata")
    /// * `media_type` - MIME type (always "application/octet-stream")
    /// * `relative_path` - Directory under shared storage, with trailing slash
    fn insert(
        &self,
        display_name: String,
        media_type: String,
        relative_path: String,
    ) -> CatalogInsertResult;

    /// Find records with exactly this relative path and display name.
    fn query(&self, relative_path: String, display_name: String) -> CatalogQueryResult;

    /// Replace the contents of a record.
    fn write(&self, handle: u64, data: Vec<u8>) -> CatalogOperationResult;

    /// Read the full contents of a record.
    fn read(&self, handle: u64) -> CatalogReadResult;

    /// Remove a record.
    fn delete(&self, handle: u64) -> CatalogOperationResult;
}

fn failure_message(error: Option<String>) -> String {
    error.unwrap_or_else(|| "Unknown error".to_string())
}

// ============================================================================
// Catalog Service Adapter
// ============================================================================

/// [`CatalogService`] backed by an app-provided [`CatalogCallback`].
pub struct CallbackCatalog {
    callback: Box<dyn CatalogCallback>,
}

impl CallbackCatalog {
    /// Wrap a callback.
    pub fn new(callback: Box<dyn CatalogCallback>) -> Self {
        Self { callback }
    }
}

impl CatalogService for CallbackCatalog {
    fn insert(&self, record: &CatalogRecord) -> CatalogResult<CatalogHandle> {
        let result = self.callback.insert(
            record.display_name.clone(),
            record.media_type.clone(),
            record.relative_path.clone(),
        );
        match (result.success, result.handle) {
            (true, Some(handle)) => Ok(CatalogHandle(handle)),
            (true, None) => Err(CatalogError::InsertRejected(
                "insert succeeded without a record handle".to_string(),
            )),
            (false, _) => Err(CatalogError::InsertRejected(failure_message(result.error))),
        }
    }

    fn query(&self, relative_path: &str, display_name: &str) -> CatalogResult<Vec<CatalogHandle>> {
        let result = self
            .callback
            .query(relative_path.to_string(), display_name.to_string());
        if result.success {
            Ok(result.handles.into_iter().map(CatalogHandle).collect())
        } else {
            Err(CatalogError::Query(failure_message(result.error)))
        }
    }

    fn open_write(&self, handle: CatalogHandle) -> CatalogResult<Box<dyn Write + Send + '_>> {
        Ok(Box::new(CallbackWriteStream {
            callback: self.callback.as_ref(),
            handle,
            buffer: Vec::new(),
        }))
    }

    fn open_read(&self, handle: CatalogHandle) -> CatalogResult<Box<dyn Read + Send + '_>> {
        let result = self.callback.read(handle.0);
        if !result.success {
            return Err(CatalogError::StreamUnavailable {
                handle,
                reason: failure_message(result.error),
            });
        }
        match result.data {
            Some(data) => Ok(Box::new(Cursor::new(data))),
            None => Err(CatalogError::StreamUnavailable {
                handle,
                reason: "no content stream".to_string(),
            }),
        }
    }

    fn delete(&self, handle: CatalogHandle) -> CatalogResult<()> {
        let result = self.callback.delete(handle.0);
        if result.success {
            Ok(())
        } else {
            Err(CatalogError::Delete(failure_message(result.error)))
        }
    }
}

/// Buffers written bytes and hands the whole buffer to the callback on
/// flush, since the callback replaces a record's contents in one call.
struct CallbackWriteStream<'a> {
    callback: &'a dyn CatalogCallback,
    handle: CatalogHandle,
    buffer: Vec<u8>,
}

impl Write for CallbackWriteStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let result = self.callback.write(self.handle.0, self.buffer.clone());
        if result.success {
            tracing::trace!(
                handle = ?self.handle,
                bytes = self.buffer.len(),
                "committed record contents"
            );
            Ok(())
        } else {
            Err(io::Error::other(failure_message(result.error)))
        }
    }
}
