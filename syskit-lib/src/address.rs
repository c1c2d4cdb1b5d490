//! Storage addresses.
//!
//! An address is a `{directory, slot name}` pair. All addresses are
//! compile-time constants; the layout below must stay bit-for-bit stable or
//! reinstalled applications will not find their payload:
//!
//! | Address          | Directory                   | Slot       |
//! |------------------|-----------------------------|------------|
//! | `HIDDEN_LEGACY`  | `Android/syskit`            | `.sysdata` |
//! | `HIDDEN_MODERN`  | `Documents/Android/syskit/` | `sysdata`  |
//! | `GENERIC`        | `Documents/`                | `sysdata`  |
//!
//! Legacy directories are relative to the external storage root. Modern
//! directories are catalog relative paths.

use std::fmt;

/// Dedicated subdirectory shared by every tier.
pub const HIDDEN_DIR: &str = "Android/syskit";

/// Slot name used while direct path access is permitted.
pub const LEGACY_SLOT_NAME: &str = ".sysdata";

/// Slot name used once access is mediated by the catalog.
pub const MODERN_SLOT_NAME: &str = "sysdata";

/// Logical storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageAddress {
    /// Slash-separated directory path.
    pub directory: &'static str,
    /// File or display name inside the directory.
    pub slot_name: &'static str,
}

impl StorageAddress {
    /// Hidden file under the external storage root.
    pub const HIDDEN_LEGACY: Self = Self::new(HIDDEN_DIR, LEGACY_SLOT_NAME);

    /// Hidden catalog record in a dedicated documents subdirectory.
    pub const HIDDEN_MODERN: Self = Self::new("Documents/Android/syskit/", MODERN_SLOT_NAME);

    /// Catalog record directly in the shared documents directory.
    pub const GENERIC: Self = Self::new("Documents/", MODERN_SLOT_NAME);

    /// Create an address.
    pub const fn new(directory: &'static str, slot_name: &'static str) -> Self {
        Self {
            directory,
            slot_name,
        }
    }

    /// Directory as a catalog relative path (always ends with `/`).
    pub fn relative_path(&self) -> String {
        normalize_relative_path(self.directory)
    }
}

impl fmt::Display for StorageAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let directory = self.directory.trim_end_matches('/');
        if directory.is_empty() {
            write!(f, "{}", self.slot_name)
        } else {
            write!(f, "{}/{}", directory, self.slot_name)
        }
    }
}

/// Append a trailing `/` to a non-empty relative path that lacks one.
///
/// Catalog services store relative paths with a trailing slash, so both
/// inserts and queries go through this.
pub fn normalize_relative_path(path: &str) -> String {
    if path.is_empty() || path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}
