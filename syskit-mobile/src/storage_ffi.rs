//! External Storage FFI
//!
//! Mobile apps create one [`ExternalStorageFFI`] at startup:
//!
//! - `new()` with the device SDK level, the external storage root and a
//!   [`CatalogCallback`] for production
//! - `direct_only()` when no catalog is available (older devices only)
//! - `new_mock()` for testing without touching device storage
//!
//! ```kotlin
//! // Kotlin example
//! val storage = ExternalStorageFFI(
//!     Build.VERSION.SDK_INT,
//!     Environment.getExternalStorageDirectory().absolutePath,
//!     MediaStoreCatalog(context.contentResolver),
//! )
//! storage.save(deviceToken)
//! val restored = storage.load()
//! ```

use std::sync::Arc;

use syskit_lib::backend::{CatalogBackend, CatalogService, InMemoryBackend, InMemoryCatalog};
use syskit_lib::{
    BackendSet, Candidate, PersistenceCoordinator, SdkLevelProbe, StorageAddress, SyskitConfig,
};

use crate::catalog_ffi::{CallbackCatalog, CatalogCallback};
use crate::{CapabilityTierFFI, Result, SyskitMobileError};

/// A storage location, as reported to the app.
#[derive(Clone, Debug, PartialEq, Eq, uniffi::Record)]
pub struct StorageLocationFFI {
    /// Backend kind ("direct-path" or "catalog").
    pub backend: String,
    /// Directory relative to the storage root, with trailing slash.
    pub relative_path: String,
    /// File or display name of the slot.
    pub slot_name: String,
}

impl StorageLocationFFI {
    fn new(backend: &str, address: &StorageAddress) -> Self {
        Self {
            backend: backend.to_string(),
            relative_path: address.relative_path(),
            slot_name: address.slot_name.to_string(),
        }
    }
}

impl From<&Candidate> for StorageLocationFFI {
    fn from(candidate: &Candidate) -> Self {
        Self::new(candidate.kind.as_str(), &candidate.address)
    }
}

/// FFI wrapper around the persistence coordinator.
#[derive(uniffi::Object)]
pub struct ExternalStorageFFI {
    coordinator: PersistenceCoordinator,
    mock: bool,
}

impl ExternalStorageFFI {
    fn from_config(
        sdk_int: i32,
        config: &SyskitConfig,
        catalog: Option<Box<dyn CatalogCallback>>,
    ) -> Arc<Self> {
        let catalog = catalog
            .map(|callback| Arc::new(CallbackCatalog::new(callback)) as Arc<dyn CatalogService>);
        let coordinator = config.build_coordinator(&SdkLevelProbe::new(sdk_int), catalog);
        tracing::debug!(sdk_int, tier = %coordinator.tier(), "external storage ready");
        Arc::new(Self {
            coordinator,
            mock: false,
        })
    }
}

#[uniffi::export]
impl ExternalStorageFFI {
    /// Create storage backed by the device.
    ///
    /// # Arguments
    ///
    /// * `sdk_int` - Android SDK level of the device
    /// * `external_root` - Absolute path of the external storage root
    /// * `catalog` - Catalog callback, used on SDK 30 and later
    #[uniffi::constructor]
    pub fn new(
        sdk_int: i32,
        external_root: String,
        catalog: Box<dyn CatalogCallback>,
    ) -> Arc<Self> {
        Self::from_config(sdk_int, &SyskitConfig::new(external_root), Some(catalog))
    }

    /// Create storage without a catalog.
    ///
    /// Saves always fail on SDK 30 and later.
    #[uniffi::constructor]
    pub fn direct_only(sdk_int: i32, external_root: String) -> Arc<Self> {
        Self::from_config(sdk_int, &SyskitConfig::new(external_root), None)
    }

    /// Create storage from a JSON configuration.
    ///
    /// # Arguments
    ///
    /// * `sdk_int` - Android SDK level of the device
    /// * `config_json` - e.g. `{"external_root": "/sdcard", "replace_existing_records": true}`
    /// * `catalog` - Catalog callback, used on SDK 30 and later
    #[uniffi::constructor]
    pub fn from_config_json(
        sdk_int: i32,
        config_json: String,
        catalog: Box<dyn CatalogCallback>,
    ) -> Result<Arc<Self>> {
        let config: SyskitConfig =
            serde_json::from_str(&config_json).map_err(|e| SyskitMobileError::InvalidInput {
                msg: format!("Invalid config JSON: {}", e),
            })?;
        Ok(Self::from_config(sdk_int, &config, Some(catalog)))
    }

    /// Create storage for testing/development.
    ///
    /// Uses in-memory storage - data is not persisted.
    #[uniffi::constructor]
    pub fn new_mock(sdk_int: i32) -> Arc<Self> {
        let backends = BackendSet::new()
            .with_direct(Arc::new(InMemoryBackend::new()))
            .with_catalog(Arc::new(CatalogBackend::new(Arc::new(InMemoryCatalog::new()))));
        Arc::new(Self {
            coordinator: PersistenceCoordinator::new(&SdkLevelProbe::new(sdk_int), backends),
            mock: true,
        })
    }

    /// Whether this instance uses in-memory storage.
    pub fn is_mock(&self) -> bool {
        self.mock
    }

    /// Save the payload. Returns `false` if `data` is absent or no location
    /// accepted it.
    pub fn save(&self, data: Option<String>) -> bool {
        self.coordinator.try_save(data.as_deref()).is_ok()
    }

    /// Save the payload and report where it landed.
    pub fn try_save(&self, data: Option<String>) -> Result<StorageLocationFFI> {
        let receipt = self.coordinator.try_save(data.as_deref())?;
        Ok(StorageLocationFFI::new(receipt.backend.as_str(), &receipt.address))
    }

    /// Load the payload, or `None` if no location holds a readable one.
    pub fn load(&self) -> Option<String> {
        self.coordinator.load()
    }

    /// Capability tier detected at construction.
    pub fn tier(&self) -> CapabilityTierFFI {
        self.coordinator.tier().into()
    }

    /// Capability tier name ("legacy" or "modern").
    pub fn tier_name(&self) -> String {
        self.coordinator.tier().as_str().to_string()
    }

    /// Locations tried by save and load, in order.
    pub fn candidate_locations(&self) -> Vec<StorageLocationFFI> {
        self.coordinator
            .candidates()
            .iter()
            .map(StorageLocationFFI::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_round_trip() {
        let storage = ExternalStorageFFI::new_mock(33);

        assert!(storage.is_mock());
        assert!(storage.save(Some("hello\nworld".to_string())));
        assert_eq!(storage.load().as_deref(), Some("hello\nworld"));
    }

    #[test]
    fn test_mock_absent_payload() {
        let storage = ExternalStorageFFI::new_mock(28);

        assert!(!storage.save(None));
        assert!(matches!(
            storage.try_save(None),
            Err(SyskitMobileError::InvalidInput { .. })
        ));
        assert_eq!(storage.load(), None);
    }

    #[test]
    fn test_try_save_reports_location() {
        let legacy = ExternalStorageFFI::new_mock(29);
        let location = legacy.try_save(Some("x".to_string())).unwrap();
        assert_eq!(
            location,
            StorageLocationFFI {
                backend: "direct-path".to_string(),
                relative_path: "Android/syskit/".to_string(),
                slot_name: ".sysdata".to_string(),
            }
        );

        let modern = ExternalStorageFFI::new_mock(30);
        let location = modern.try_save(Some("x".to_string())).unwrap();
        assert_eq!(location.backend, "catalog");
        assert_eq!(location.relative_path, "Documents/Android/syskit/");
        assert_eq!(location.slot_name, "sysdata");
    }

    #[test]
    fn test_candidate_locations() {
        let legacy = ExternalStorageFFI::new_mock(21);
        assert_eq!(legacy.tier(), CapabilityTierFFI::Legacy);
        assert_eq!(legacy.tier_name(), "legacy");
        assert_eq!(legacy.candidate_locations().len(), 1);

        let modern = ExternalStorageFFI::new_mock(34);
        assert_eq!(modern.tier_name(), "modern");
        let locations = modern.candidate_locations();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].relative_path, "Documents/Android/syskit/");
        assert_eq!(locations[1].relative_path, "Documents/");
    }

    #[test]
    fn test_direct_only_modern_cannot_save() {
        let storage = ExternalStorageFFI::direct_only(30, "/nonexistent".to_string());

        assert!(!storage.is_mock());
        assert!(matches!(
            storage.try_save(Some("x".to_string())),
            Err(SyskitMobileError::Storage { .. })
        ));
        assert_eq!(storage.load(), None);
    }
}
