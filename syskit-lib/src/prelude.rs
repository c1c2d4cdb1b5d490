//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use syskit_lib::prelude::*;
//! ```

// Coordinator
pub use crate::coordinator::{BackendSet, LoadedPayload, PersistenceCoordinator, SaveReceipt};

// Error handling
pub use crate::errors::{SyskitError, SyskitErrorCode};
pub use crate::Result;

// Tier and selection
pub use crate::address::StorageAddress;
pub use crate::selector::{BackendKind, Candidate};
pub use crate::tier::{CapabilityTier, FixedTier, SdkLevelProbe, TierProbe};

// Backends
pub use crate::backend::{
    CatalogBackend, CatalogService, DirectPathBackend, InMemoryBackend, InMemoryCatalog,
    StorageBackend,
};

// Configuration
pub use crate::config::SyskitConfig;
