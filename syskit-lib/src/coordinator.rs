//! Persistence coordinator.
//!
//! Walks the selector's candidate list for the current tier. A save encodes
//! the payload once and stops at the first backend that accepts it, so a
//! successful call writes exactly one location. A load returns the first
//! candidate whose contents decode. Backend and decode failures only move
//! the walk forward; callers see a boolean or an `Option`.

use std::fmt;
use std::sync::Arc;

use crate::address::StorageAddress;
use crate::backend::StorageBackend;
use crate::codec;
use crate::errors::SyskitError;
use crate::selector::{ordered_backends, BackendKind, Candidate};
use crate::tier::{CapabilityTier, TierProbe};
use crate::Result;

/// Backend implementations available to a coordinator, one per kind.
#[derive(Clone, Default)]
pub struct BackendSet {
    direct: Option<Arc<dyn StorageBackend>>,
    catalog: Option<Arc<dyn StorageBackend>>,
}

impl BackendSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `backend` for direct path candidates.
    pub fn with_direct(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.direct = Some(backend);
        self
    }

    /// Use `backend` for catalog candidates.
    pub fn with_catalog(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.catalog = Some(backend);
        self
    }

    /// Backend registered for `kind`, if any.
    pub fn get(&self, kind: BackendKind) -> Option<&Arc<dyn StorageBackend>> {
        match kind {
            BackendKind::DirectPath => self.direct.as_ref(),
            BackendKind::Catalog => self.catalog.as_ref(),
        }
    }
}

impl fmt::Debug for BackendSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSet")
            .field("direct", &self.direct.as_ref().map(|b| b.name()))
            .field("catalog", &self.catalog.as_ref().map(|b| b.name()))
            .finish()
    }
}

/// Where a successful save landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveReceipt {
    /// Backend that accepted the write.
    pub backend: BackendKind,
    /// Address written.
    pub address: StorageAddress,
    /// Candidates tried, including the successful one.
    pub attempts: usize,
}

/// A payload found by a load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedPayload {
    /// Decoded payload.
    pub text: String,
    /// Backend it was read from.
    pub backend: BackendKind,
    /// Address it was read from.
    pub address: StorageAddress,
}

/// Saves and loads the payload across the candidates of one tier.
///
/// Holds no mutable state; share freely between threads. Concurrent saves
/// race at the storage layer and are not serialized here.
#[derive(Debug, Clone)]
pub struct PersistenceCoordinator {
    tier: CapabilityTier,
    backends: BackendSet,
}

impl PersistenceCoordinator {
    /// Probe the tier once and build a coordinator.
    pub fn new<P: TierProbe + ?Sized>(probe: &P, backends: BackendSet) -> Self {
        Self::with_tier(probe.tier(), backends)
    }

    /// Build a coordinator for a known tier.
    pub fn with_tier(tier: CapabilityTier, backends: BackendSet) -> Self {
        tracing::debug!(%tier, ?backends, "persistence coordinator created");
        Self { tier, backends }
    }

    /// Tier fixed at construction.
    pub fn tier(&self) -> CapabilityTier {
        self.tier
    }

    /// Candidates in the order saves and loads try them.
    pub fn candidates(&self) -> &'static [Candidate] {
        ordered_backends(self.tier)
    }

    /// Persist `text`. Returns true iff some backend accepted it.
    pub fn save(&self, text: &str) -> bool {
        self.try_save(Some(text)).is_ok()
    }

    /// Persist `text`, reporting where it went.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `text` is `None`; nothing is written
    /// - `AllBackendsExhausted` if every candidate failed
    #[tracing::instrument(skip_all, fields(tier = %self.tier))]
    pub fn try_save(&self, text: Option<&str>) -> Result<SaveReceipt> {
        let text = text.ok_or_else(|| {
            tracing::error!("refusing to save an absent payload");
            SyskitError::invalid_input("payload", "absent payload cannot be persisted")
        })?;
        let encoded = codec::encode(text);
        tracing::debug!(
            payload_len = text.len(),
            encoded_len = encoded.len(),
            "saving payload"
        );

        let mut attempts = 0;
        for candidate in self.candidates() {
            attempts += 1;
            let Some(backend) = self.backend_for(candidate) else {
                continue;
            };

            match backend.write(&candidate.address, encoded.as_bytes()) {
                Ok(()) => {
                    tracing::info!(
                        backend = backend.name(),
                        address = %candidate.address,
                        attempts,
                        "payload saved"
                    );
                    return Ok(SaveReceipt {
                        backend: candidate.kind,
                        address: candidate.address,
                        attempts,
                    });
                }
                Err(e) => {
                    let err = SyskitError::backend_unavailable(backend.name(), &e);
                    tracing::warn!(
                        address = %candidate.address,
                        error = %err,
                        "write failed, trying next candidate"
                    );
                }
            }
        }

        tracing::error!(attempts, "no storage candidate accepted the payload");
        Err(SyskitError::AllBackendsExhausted { attempts })
    }

    /// Load the stored payload, or `None` if no candidate holds one.
    pub fn load(&self) -> Option<String> {
        self.try_load().ok().map(|loaded| loaded.text)
    }

    /// Load the stored payload, reporting where it came from.
    ///
    /// # Errors
    ///
    /// `AllBackendsExhausted` if no candidate yielded a decodable payload.
    #[tracing::instrument(skip_all, fields(tier = %self.tier))]
    pub fn try_load(&self) -> Result<LoadedPayload> {
        let mut attempts = 0;
        for candidate in self.candidates() {
            attempts += 1;
            let Some(backend) = self.backend_for(candidate) else {
                continue;
            };

            let bytes = match backend.read(&candidate.address) {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    tracing::debug!(address = %candidate.address, "nothing stored");
                    continue;
                }
                Err(e) => {
                    let err = SyskitError::backend_unavailable(backend.name(), &e);
                    tracing::warn!(
                        address = %candidate.address,
                        error = %err,
                        "read failed, trying next candidate"
                    );
                    continue;
                }
            };

            match codec::decode(&bytes) {
                Ok(text) => {
                    tracing::info!(
                        backend = backend.name(),
                        address = %candidate.address,
                        payload_len = text.len(),
                        "payload loaded"
                    );
                    return Ok(LoadedPayload {
                        text,
                        backend: candidate.kind,
                        address: candidate.address,
                    });
                }
                Err(e) => {
                    let err = SyskitError::from(e);
                    tracing::warn!(
                        address = %candidate.address,
                        error = %err,
                        "skipping undecodable slot"
                    );
                }
            }
        }

        tracing::debug!(attempts, "no stored payload found");
        Err(SyskitError::AllBackendsExhausted { attempts })
    }

    fn backend_for(&self, candidate: &Candidate) -> Option<&Arc<dyn StorageBackend>> {
        let backend = self.backends.get(candidate.kind);
        if backend.is_none() {
            tracing::warn!(
                kind = %candidate.kind,
                address = %candidate.address,
                "no backend registered for candidate, skipping"
            );
        }
        backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SyskitErrorCode;
    use crate::backend::CatalogBackend;
    use crate::test_utils::{FlakyCatalog, ScriptedBackend};
    use crate::tier::FixedTier;

    fn modern_with(catalog: &Arc<ScriptedBackend>) -> PersistenceCoordinator {
        PersistenceCoordinator::with_tier(
            CapabilityTier::Modern,
            BackendSet::new().with_catalog(catalog.clone()),
        )
    }

    #[test]
    fn test_save_writes_primary_only() {
        let catalog = Arc::new(ScriptedBackend::new("catalog"));
        let coordinator = modern_with(&catalog);

        let receipt = coordinator.try_save(Some("hello\nworld")).unwrap();

        assert_eq!(receipt.address, StorageAddress::HIDDEN_MODERN);
        assert_eq!(receipt.attempts, 1);
        assert_eq!(catalog.write_log(), vec![StorageAddress::HIDDEN_MODERN]);
        assert_eq!(
            catalog.stored(&StorageAddress::HIDDEN_MODERN),
            Some(b"aGVsbG8Kd29ybGQ=".to_vec())
        );
        assert_eq!(catalog.stored(&StorageAddress::GENERIC), None);
    }

    #[test]
    fn test_save_falls_back_to_generic() {
        let catalog = Arc::new(ScriptedBackend::new("catalog"));
        catalog.fail_writes_to(StorageAddress::HIDDEN_MODERN);
        let coordinator = modern_with(&catalog);

        let receipt = coordinator.try_save(Some("x")).unwrap();

        assert_eq!(receipt.address, StorageAddress::GENERIC);
        assert_eq!(receipt.attempts, 2);
        assert_eq!(coordinator.load().as_deref(), Some("x"));
        assert_eq!(
            coordinator.try_load().unwrap().address,
            StorageAddress::GENERIC
        );
    }

    #[test]
    fn test_save_reports_exhaustion() {
        let catalog = Arc::new(ScriptedBackend::new("catalog"));
        catalog.fail_writes_to(StorageAddress::HIDDEN_MODERN);
        catalog.fail_writes_to(StorageAddress::GENERIC);
        let coordinator = modern_with(&catalog);

        assert!(!coordinator.save("x"));
        let err = coordinator.try_save(Some("x")).unwrap_err();
        assert!(matches!(err, SyskitError::AllBackendsExhausted { attempts: 2 }));
    }

    #[test]
    fn test_absent_payload_is_rejected_without_io() {
        let catalog = Arc::new(ScriptedBackend::new("catalog"));
        let coordinator = modern_with(&catalog);

        let err = coordinator.try_save(None).unwrap_err();

        assert_eq!(err.code(), SyskitErrorCode::InvalidInput);
        assert!(catalog.write_log().is_empty());
        assert!(catalog.read_log().is_empty());
    }

    #[test]
    fn test_load_absent_when_nothing_written() {
        let catalog = Arc::new(ScriptedBackend::new("catalog"));
        let coordinator = modern_with(&catalog);

        assert_eq!(coordinator.load(), None);
        assert_eq!(
            catalog.read_log(),
            vec![StorageAddress::HIDDEN_MODERN, StorageAddress::GENERIC]
        );
    }

    #[test]
    fn test_load_skips_undecodable_slot() {
        let catalog = Arc::new(ScriptedBackend::new("catalog"));
        catalog.seed(StorageAddress::HIDDEN_MODERN, b"not base64 at all!");
        catalog.seed(StorageAddress::GENERIC, codec::encode("fallback").as_bytes());
        let coordinator = modern_with(&catalog);

        assert_eq!(coordinator.load().as_deref(), Some("fallback"));
    }

    #[test]
    fn test_load_skips_failing_read() {
        let catalog = Arc::new(ScriptedBackend::new("catalog"));
        catalog.seed(StorageAddress::HIDDEN_MODERN, codec::encode("primary").as_bytes());
        catalog.seed(StorageAddress::GENERIC, codec::encode("secondary").as_bytes());
        catalog.fail_reads_from(StorageAddress::HIDDEN_MODERN);
        let coordinator = modern_with(&catalog);

        assert_eq!(coordinator.load().as_deref(), Some("secondary"));
    }

    #[test]
    fn test_load_prefers_primary() {
        let catalog = Arc::new(ScriptedBackend::new("catalog"));
        catalog.seed(StorageAddress::HIDDEN_MODERN, codec::encode("primary").as_bytes());
        catalog.seed(StorageAddress::GENERIC, codec::encode("secondary").as_bytes());
        let coordinator = modern_with(&catalog);

        assert_eq!(coordinator.load().as_deref(), Some("primary"));
        assert_eq!(catalog.read_log(), vec![StorageAddress::HIDDEN_MODERN]);
    }

    #[test]
    fn test_empty_payload_round_trip() {
        let catalog = Arc::new(ScriptedBackend::new("catalog"));
        let coordinator = modern_with(&catalog);

        assert!(coordinator.save(""));
        assert_eq!(coordinator.load().as_deref(), Some(""));
    }

    #[test]
    fn test_missing_backend_is_skipped() {
        let coordinator =
            PersistenceCoordinator::new(&FixedTier(CapabilityTier::Legacy), BackendSet::new());

        assert!(!coordinator.save("x"));
        assert_eq!(coordinator.load(), None);
    }

    #[test]
    fn test_legacy_uses_direct_backend_only() {
        let direct = Arc::new(ScriptedBackend::new("direct-path"));
        let catalog = Arc::new(ScriptedBackend::new("catalog"));
        let coordinator = PersistenceCoordinator::with_tier(
            CapabilityTier::Legacy,
            BackendSet::new()
                .with_direct(direct.clone())
                .with_catalog(catalog.clone()),
        );

        assert!(coordinator.save("legacy"));
        assert_eq!(direct.write_log(), vec![StorageAddress::HIDDEN_LEGACY]);
        assert!(catalog.write_log().is_empty());
    }

    #[test]
    fn test_reads_are_idempotent() {
        let catalog = Arc::new(ScriptedBackend::new("catalog"));
        let coordinator = modern_with(&catalog);
        coordinator.save("stable");

        assert_eq!(coordinator.load(), coordinator.load());
    }

    #[test]
    fn test_backend_set_debug_names_backends() {
        let set = BackendSet::new().with_catalog(Arc::new(ScriptedBackend::new("catalog")));
        let debug = format!("{:?}", set);
        assert!(debug.contains("catalog"));
        assert!(set.get(BackendKind::DirectPath).is_none());
    }

    fn modern_over(catalog: &Arc<FlakyCatalog>) -> PersistenceCoordinator {
        PersistenceCoordinator::with_tier(
            CapabilityTier::Modern,
            BackendSet::new().with_catalog(Arc::new(CatalogBackend::new(catalog.clone()))),
        )
    }

    #[test]
    fn test_primary_stream_failure_falls_back_without_leftovers() {
        let catalog = Arc::new(FlakyCatalog::new());
        catalog.break_write_streams_under("Documents/Android/syskit/");
        let coordinator = modern_over(&catalog);

        let receipt = coordinator.try_save(Some("x")).unwrap();
        assert_eq!(receipt.address, StorageAddress::GENERIC);

        let loaded = coordinator.try_load().unwrap();
        assert_eq!(loaded.text, "x");
        assert_eq!(loaded.address, StorageAddress::GENERIC);

        let records = catalog.inner().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0.relative_path, "Documents/");
    }

    #[test]
    fn test_failed_save_keeps_previous_payload() {
        let catalog = Arc::new(FlakyCatalog::new());
        let coordinator = modern_over(&catalog);
        assert!(coordinator.save("old"));

        catalog.reject_inserts_under("Documents/Android/syskit/");
        catalog.reject_inserts_under("Documents/");
        assert!(!coordinator.save("new"));

        assert_eq!(coordinator.load().as_deref(), Some("old"));
    }

    #[test]
    fn test_failed_stream_on_resave_keeps_previous_payload() {
        let catalog = Arc::new(FlakyCatalog::new());
        let coordinator = modern_over(&catalog);
        assert!(coordinator.save("old"));

        catalog.break_write_streams_under("Documents/Android/syskit/");
        catalog.reject_inserts_under("Documents/");
        assert!(!coordinator.save("new"));

        assert_eq!(coordinator.load().as_deref(), Some("old"));
        assert_eq!(catalog.inner().len(), 1);
    }
}
