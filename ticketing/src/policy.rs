//! Access profiles selected when the service is built.
//!
//! Deployments of the ledger differ in who may do what. Rather than branching on
//! deployment flavour inside each operation, the service is handed one
//! [`AccessProfile`] and asks it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which authorization rules are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessProfile {
    /// No role or ownership checks beyond organizer management
    Open,
    /// Organizers/admin manage listings and may not buy
    #[default]
    RoleGated,
    /// Creators own listings, buyers own tickets
    OwnershipGated,
    /// Role and ownership checks together
    Strict,
}

impl AccessProfile {
    /// Creating and deleting listings requires organizer or admin rights
    #[must_use]
    pub const fn gates_by_role(self) -> bool {
        matches!(self, Self::RoleGated | Self::Strict)
    }

    /// Deleting listings and reselling tickets requires ownership
    #[must_use]
    pub const fn gates_by_ownership(self) -> bool {
        matches!(self, Self::OwnershipGated | Self::Strict)
    }

    /// Organizers and the admin may not purchase tickets
    #[must_use]
    pub const fn forbids_organizer_purchase(self) -> bool {
        self.gates_by_role()
    }

    /// Profile name as accepted by [`FromStr`]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::RoleGated => "role-gated",
            Self::OwnershipGated => "ownership-gated",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for AccessProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "role-gated" | "role_gated" => Ok(Self::RoleGated),
            "ownership-gated" | "ownership_gated" => Ok(Self::OwnershipGated),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "unknown access profile '{other}' (expected open, role-gated, ownership-gated or strict)"
            )),
        }
    }
}

/// Behavioural switches for the ticket service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePolicy {
    /// Authorization rules
    pub profile: AccessProfile,
    /// Reject purchases by anyone but the reservation holder
    pub enforce_reservations: bool,
    /// Decrement the listing's sold count when a ticket is refunded
    pub restore_inventory_on_refund: bool,
}

impl Default for ServicePolicy {
    fn default() -> Self {
        Self {
            profile: AccessProfile::default(),
            enforce_reservations: false,
            restore_inventory_on_refund: true,
        }
    }
}

impl ServicePolicy {
    /// Default switches with the given profile
    #[must_use]
    pub fn with_profile(profile: AccessProfile) -> Self {
        Self {
            profile,
            ..Self::default()
        }
    }
}
