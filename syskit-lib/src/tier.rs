//! Environment capability tiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::{LEGACY_SLOT_NAME, MODERN_SLOT_NAME};

/// Which storage access model the host permits.
///
/// Ordered: later releases compare greater.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityTier {
    /// Raw hierarchical file access to shared storage is allowed.
    Legacy,
    /// Shared storage is reachable only through the catalog service.
    Modern,
}

impl CapabilityTier {
    /// First SDK level on which shared storage is only reachable through
    /// the catalog.
    pub const MODERN_SDK_LEVEL: i32 = 30;

    /// Classify a host SDK level.
    pub fn from_sdk_int(sdk_int: i32) -> Self {
        if sdk_int >= Self::MODERN_SDK_LEVEL {
            Self::Modern
        } else {
            Self::Legacy
        }
    }

    /// Slot name used by every address of this tier.
    pub fn slot_name(&self) -> &'static str {
        match self {
            Self::Legacy => LEGACY_SLOT_NAME,
            Self::Modern => MODERN_SLOT_NAME,
        }
    }

    /// Whether direct path access is legal on this tier.
    pub fn permits_direct_access(&self) -> bool {
        matches!(self, Self::Legacy)
    }

    /// Lowercase name as used in logs and serialized config.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Modern => "modern",
        }
    }
}

impl fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of the capability tier.
///
/// Probed once when a coordinator is built; the value is fixed for the
/// coordinator's lifetime.
pub trait TierProbe: Send + Sync {
    /// Current tier of the host environment.
    fn tier(&self) -> CapabilityTier;
}

/// Probe that always reports the same tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedTier(pub CapabilityTier);

impl TierProbe for FixedTier {
    fn tier(&self) -> CapabilityTier {
        self.0
    }
}

/// Probe backed by the host SDK level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SdkLevelProbe {
    sdk_int: i32,
}

impl SdkLevelProbe {
    /// Create a probe for the given SDK level.
    pub fn new(sdk_int: i32) -> Self {
        Self { sdk_int }
    }

    /// The SDK level this probe reports on.
    pub fn sdk_int(&self) -> i32 {
        self.sdk_int
    }
}

impl TierProbe for SdkLevelProbe {
    fn tier(&self) -> CapabilityTier {
        CapabilityTier::from_sdk_int(self.sdk_int)
    }
}

impl<F> TierProbe for F
where
    F: Fn() -> CapabilityTier + Send + Sync,
{
    fn tier(&self) -> CapabilityTier {
        self()
    }
}
