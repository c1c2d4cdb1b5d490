//! Direct path backend.
//!
//! Writes the payload as a plain file under the external storage root. Only
//! legal on tiers that still permit raw file access to shared storage.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{strip_trailing_line_separator, BackendError, BackendResult, StorageBackend};
use crate::address::StorageAddress;

/// File-per-address backend rooted at the external storage directory.
#[derive(Debug, Clone)]
pub struct DirectPathBackend {
    root: PathBuf,
}

impl DirectPathBackend {
    /// Create a backend rooted at `root` (e.g. `/sdcard`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The external storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the slot for `address`.
    pub fn directory_path(&self, address: &StorageAddress) -> PathBuf {
        self.root.join(address.directory.trim_end_matches('/'))
    }

    /// Full path of the slot file for `address`.
    pub fn file_path(&self, address: &StorageAddress) -> PathBuf {
        self.directory_path(address).join(address.slot_name)
    }
}

impl StorageBackend for DirectPathBackend {
    fn name(&self) -> &'static str {
        "direct-path"
    }

    fn write(&self, address: &StorageAddress, data: &[u8]) -> BackendResult<()> {
        let dir = self.directory_path(address);
        fs::create_dir_all(&dir).map_err(|source| BackendError::DirectoryCreation {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(address.slot_name);
        let mut file = File::create(&path)?;
        file.write_all(data)?;
        file.flush()?;
        file.sync_all()?;

        tracing::debug!(path = %path.display(), bytes = data.len(), "wrote slot file");
        Ok(())
    }

    fn read(&self, address: &StorageAddress) -> BackendResult<Option<Vec<u8>>> {
        let path = self.file_path(address);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(strip_trailing_line_separator(bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "slot file does not exist");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_hidden_directory() {
        let tmp = TempDir::new().unwrap();
        let backend = DirectPathBackend::new(tmp.path());
        let address = StorageAddress::HIDDEN_LEGACY;

        backend.write(&address, b"aGVsbG8=").unwrap();

        let file = tmp.path().join("Android").join("syskit").join(".sysdata");
        assert_eq!(backend.file_path(&address), file);
        assert_eq!(fs::read(&file).unwrap(), b"aGVsbG8=");
    }

    #[test]
    fn test_write_truncates_previous_contents() {
        let tmp = TempDir::new().unwrap();
        let backend = DirectPathBackend::new(tmp.path());
        let address = StorageAddress::HIDDEN_LEGACY;

        backend.write(&address, b"a much longer previous value").unwrap();
        backend.write(&address, b"short").unwrap();

        assert_eq!(backend.read(&address).unwrap(), Some(b"short".to_vec()));
    }

    #[test]
    fn test_read_missing_file_is_absent() {
        let tmp = TempDir::new().unwrap();
        let backend = DirectPathBackend::new(tmp.path());
        assert_eq!(backend.read(&StorageAddress::HIDDEN_LEGACY).unwrap(), None);
    }

    #[test]
    fn test_read_strips_appended_newline() {
        let tmp = TempDir::new().unwrap();
        let backend = DirectPathBackend::new(tmp.path());
        let address = StorageAddress::HIDDEN_LEGACY;
        fs::create_dir_all(backend.directory_path(&address)).unwrap();
        fs::write(backend.file_path(&address), b"aGk=\n").unwrap();

        assert_eq!(backend.read(&address).unwrap(), Some(b"aGk=".to_vec()));
    }

    #[test]
    fn test_empty_file_reads_as_present() {
        let tmp = TempDir::new().unwrap();
        let backend = DirectPathBackend::new(tmp.path());
        let address = StorageAddress::HIDDEN_LEGACY;

        backend.write(&address, b"").unwrap();
        assert_eq!(backend.read(&address).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_directory_creation_failure() {
        let tmp = TempDir::new().unwrap();
        // A regular file where the "Android" directory should be.
        fs::write(tmp.path().join("Android"), b"in the way").unwrap();
        let backend = DirectPathBackend::new(tmp.path());

        let err = backend
            .write(&StorageAddress::HIDDEN_LEGACY, b"aGk=")
            .unwrap_err();
        assert!(matches!(err, BackendError::DirectoryCreation { .. }));
    }
}
