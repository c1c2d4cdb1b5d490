//! syskit library.
//!
//! Persists a single text payload in shared external storage so it outlives
//! the application that wrote it. The host's storage model depends on its
//! release: older releases allow plain file paths, newer ones only a
//! catalog service. This crate picks the legal backend for the detected
//! capability tier, builds the address for it, and falls back to a
//! secondary location when the preferred one fails.
//!
//! The crate holds no global state. Hosts inject the tier probe and the
//! backend implementations through [`PersistenceCoordinator`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use syskit_lib::backend::{CatalogBackend, InMemoryCatalog};
//! use syskit_lib::{BackendSet, CapabilityTier, FixedTier, PersistenceCoordinator};
//!
//! let catalog = Arc::new(CatalogBackend::new(Arc::new(InMemoryCatalog::new())));
//! let coordinator = PersistenceCoordinator::new(
//!     &FixedTier(CapabilityTier::Modern),
//!     BackendSet::new().with_catalog(catalog),
//! );
//!
//! assert!(coordinator.save("hello\nworld"));
//! assert_eq!(coordinator.load().as_deref(), Some("hello\nworld"));
//! ```

pub mod address;
pub mod backend;
pub mod codec;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod prelude;
pub mod selector;
pub mod tier;

/// Test utilities for backend fault injection.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use address::StorageAddress;
pub use config::SyskitConfig;
pub use coordinator::{BackendSet, LoadedPayload, PersistenceCoordinator, SaveReceipt};
pub use errors::{SyskitError, SyskitErrorCode};
pub use selector::{ordered_backends, BackendKind, Candidate};
pub use tier::{CapabilityTier, FixedTier, SdkLevelProbe, TierProbe};

/// Common result alias for syskit operations.
pub type Result<T> = std::result::Result<T, SyskitError>;
