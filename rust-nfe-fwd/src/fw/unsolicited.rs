//! Unsolicited Data policy.
//!
//! Decides what happens to Data that matches no PIT entry. The conservative
//! default drops it; the other policies admit it into the Content Store
//! depending on where it came from.

use rust_nfe_common::FaceScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsolicitedDataDecision {
    Drop,
    Cache,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsolicitedDataPolicy {
    /// Drop all unsolicited Data.
    #[default]
    DropAll,
    /// Cache unsolicited Data from local faces only.
    AdmitLocal,
    /// Cache unsolicited Data from non-local faces only.
    AdmitNetwork,
    /// Cache all unsolicited Data.
    AdmitAll,
}

impl UnsolicitedDataPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "drop-all" => Some(Self::DropAll),
            "admit-local" => Some(Self::AdmitLocal),
            "admit-network" => Some(Self::AdmitNetwork),
            "admit-all" => Some(Self::AdmitAll),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DropAll => "drop-all",
            Self::AdmitLocal => "admit-local",
            Self::AdmitNetwork => "admit-network",
            Self::AdmitAll => "admit-all",
        }
    }

    pub fn decide(&self, in_scope: FaceScope) -> UnsolicitedDataDecision {
        let cache = match self {
            Self::DropAll => false,
            Self::AdmitLocal => in_scope == FaceScope::Local,
            Self::AdmitNetwork => in_scope == FaceScope::NonLocal,
            Self::AdmitAll => true,
        };
        if cache {
            UnsolicitedDataDecision::Cache
        } else {
            UnsolicitedDataDecision::Drop
        }
    }
}
