//! syskit Mobile FFI Bindings
//!
//! This crate provides UniFFI bindings for syskit, so Android (Kotlin) and
//! iOS (Swift) apps can persist their payload in shared external storage.
//!
//! # Architecture
//!
//! - [`ExternalStorageFFI`]: the object apps hold; saves and loads the payload
//! - [`CatalogCallback`]: implemented by the app over its catalog service
//!   (MediaStore on Android)
//! - Free functions for the payload encoding and tier lookup
//!
//! # Thread Safety
//!
//! All exposed types are thread-safe and can be used from any thread.

pub mod catalog_ffi;
pub mod storage_ffi;

pub use catalog_ffi::{
    CallbackCatalog, CatalogCallback, CatalogInsertResult, CatalogOperationResult,
    CatalogQueryResult, CatalogReadResult,
};
pub use storage_ffi::{ExternalStorageFFI, StorageLocationFFI};

use syskit_lib::{codec, CapabilityTier, SyskitError};

// UniFFI scaffolding
uniffi::setup_scaffolding!();

// ============================================================================
// Error Types
// ============================================================================

/// Mobile-friendly error type.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum SyskitMobileError {
    /// Caller supplied an unusable value.
    #[error("Invalid input: {msg}")]
    InvalidInput { msg: String },

    /// No storage location accepted or returned the payload.
    #[error("Storage error: {msg}")]
    Storage { msg: String },

    /// Internal error (unexpected state).
    #[error("Internal error: {msg}")]
    Internal { msg: String },
}

impl From<SyskitError> for SyskitMobileError {
    fn from(e: SyskitError) -> Self {
        match e {
            SyskitError::InvalidInput { .. } => Self::InvalidInput { msg: e.message() },
            SyskitError::BackendUnavailable { .. }
            | SyskitError::Decode(_)
            | SyskitError::AllBackendsExhausted { .. } => Self::Storage { msg: e.message() },
            SyskitError::Internal(msg) => Self::Internal { msg },
        }
    }
}

pub type Result<T> = std::result::Result<T, SyskitMobileError>;

// ============================================================================
// Capability Tier
// ============================================================================

/// Storage capability tier of the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum CapabilityTierFFI {
    /// Plain file paths on external storage are allowed.
    Legacy,
    /// Shared storage is reachable only through the catalog service.
    Modern,
}

impl From<CapabilityTier> for CapabilityTierFFI {
    fn from(tier: CapabilityTier) -> Self {
        match tier {
            CapabilityTier::Legacy => Self::Legacy,
            CapabilityTier::Modern => Self::Modern,
        }
    }
}

impl From<CapabilityTierFFI> for CapabilityTier {
    fn from(tier: CapabilityTierFFI) -> Self {
        match tier {
            CapabilityTierFFI::Legacy => Self::Legacy,
            CapabilityTierFFI::Modern => Self::Modern,
        }
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Encode a payload the way it is stored on disk.
#[uniffi::export]
pub fn encode_payload(text: String) -> String {
    codec::encode(&text)
}

/// Decode stored bytes back into a payload.
///
/// Returns `None` when the input is not valid base64 or does not decode to
/// UTF-8 text.
#[uniffi::export]
pub fn decode_payload(encoded: String) -> Option<String> {
    codec::decode(encoded).ok()
}

/// Capability tier for an Android SDK level.
#[uniffi::export]
pub fn capability_tier_for_sdk(sdk_int: i32) -> CapabilityTierFFI {
    CapabilityTier::from_sdk_int(sdk_int).into()
}

/// Get the library version.
#[uniffi::export]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_helpers() {
        assert_eq!(encode_payload("hello\nworld".to_string()), "aGVsbG8Kd29ybGQ=");
        assert_eq!(
            decode_payload("aGVsbG8Kd29ybGQ=".to_string()).as_deref(),
            Some("hello\nworld")
        );
        assert_eq!(decode_payload("not base64!".to_string()), None);
        assert_eq!(decode_payload(String::new()).as_deref(), Some(""));
    }

    #[test]
    fn test_tier_for_sdk() {
        assert_eq!(capability_tier_for_sdk(29), CapabilityTierFFI::Legacy);
        assert_eq!(capability_tier_for_sdk(30), CapabilityTierFFI::Modern);
        assert_eq!(
            CapabilityTier::from(CapabilityTierFFI::Modern),
            CapabilityTier::Modern
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: SyskitMobileError = SyskitError::invalid_input("data", "payload is absent").into();
        assert!(matches!(err, SyskitMobileError::InvalidInput { .. }));

        let err: SyskitMobileError = SyskitError::AllBackendsExhausted { attempts: 2 }.into();
        assert!(matches!(err, SyskitMobileError::Storage { .. }));

        let err: SyskitMobileError = SyskitError::Internal("boom".to_string()).into();
        assert_eq!(err.to_string(), "Internal error: boom");
    }

    #[test]
    fn test_version() {
        assert!(!get_version().is_empty());
    }
}
