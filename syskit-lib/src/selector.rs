//! Backend selection policy.
//!
//! The whole policy is one table keyed by capability tier:
//!
//! | Tier   | Priority 1                  | Priority 2          |
//! |--------|-----------------------------|---------------------|
//! | Legacy | DirectPath @ HIDDEN_LEGACY  |                     |
//! | Modern | Catalog @ HIDDEN_MODERN     | Catalog @ GENERIC   |
//!
//! Saves and loads walk the same list.

use std::fmt;

use crate::address::StorageAddress;
use crate::tier::CapabilityTier;

/// Storage backend variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Raw hierarchical file access.
    DirectPath,
    /// Insert/query catalog service.
    Catalog,
}

impl BackendKind {
    /// Name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectPath => "direct-path",
            Self::Catalog => "catalog",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the priority list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Backend to use.
    pub kind: BackendKind,
    /// Where that backend should store the payload.
    pub address: StorageAddress,
}

impl Candidate {
    const fn new(kind: BackendKind, address: StorageAddress) -> Self {
        Self { kind, address }
    }
}

const LEGACY_CANDIDATES: [Candidate; 1] = [Candidate::new(
    BackendKind::DirectPath,
    StorageAddress::HIDDEN_LEGACY,
)];

const MODERN_CANDIDATES: [Candidate; 2] = [
    Candidate::new(BackendKind::Catalog, StorageAddress::HIDDEN_MODERN),
    Candidate::new(BackendKind::Catalog, StorageAddress::GENERIC),
];

/// Ordered candidates for a tier. Pure; performs no I/O.
pub fn ordered_backends(tier: CapabilityTier) -> &'static [Candidate] {
    match tier {
        CapabilityTier::Legacy => &LEGACY_CANDIDATES,
        CapabilityTier::Modern => &MODERN_CANDIDATES,
    }
}
