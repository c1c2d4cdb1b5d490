//! Construction-time configuration.
//!
//! There are no environment variables or config files; hosts describe their
//! storage once and build a coordinator from it.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::{CatalogBackend, CatalogService, DirectPathBackend};
use crate::coordinator::{BackendSet, PersistenceCoordinator};
use crate::tier::TierProbe;

/// Storage configuration for a host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyskitConfig {
    /// External storage root used by the direct path backend.
    #[serde(default = "default_external_root")]
    pub external_root: PathBuf,

    /// Remove existing catalog records at an address before inserting.
    #[serde(default = "default_replace_existing_records")]
    pub replace_existing_records: bool,
}

fn default_external_root() -> PathBuf {
    PathBuf::from("/sdcard")
}

fn default_replace_existing_records() -> bool {
    true
}

impl Default for SyskitConfig {
    fn default() -> Self {
        Self {
            external_root: default_external_root(),
            replace_existing_records: default_replace_existing_records(),
        }
    }
}

impl SyskitConfig {
    /// Create a configuration for the given external storage root.
    pub fn new(external_root: impl Into<PathBuf>) -> Self {
        Self {
            external_root: external_root.into(),
            ..Self::default()
        }
    }

    /// Set whether catalog saves replace earlier records.
    pub fn with_replace_existing_records(mut self, replace: bool) -> Self {
        self.replace_existing_records = replace;
        self
    }

    /// Backends described by this configuration.
    ///
    /// The direct path backend is always present; the selector decides
    /// whether the current tier may use it. The catalog backend exists only
    /// when the host supplies a catalog service.
    pub fn backends(&self, catalog: Option<Arc<dyn CatalogService>>) -> BackendSet {
        let mut backends =
            BackendSet::new().with_direct(Arc::new(DirectPathBackend::new(&self.external_root)));
        if let Some(catalog) = catalog {
            let backend = if self.replace_existing_records {
                CatalogBackend::new(catalog)
            } else {
                CatalogBackend::appending(catalog)
            };
            backends = backends.with_catalog(Arc::new(backend));
        }
        backends
    }

    /// Probe the tier and build a coordinator.
    pub fn build_coordinator<P: TierProbe + ?Sized>(
        &self,
        probe: &P,
        catalog: Option<Arc<dyn CatalogService>>,
    ) -> PersistenceCoordinator {
        PersistenceCoordinator::new(probe, self.backends(catalog))
    }
}
