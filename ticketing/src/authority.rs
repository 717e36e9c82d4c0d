//! Who counts as an organizer.
//!
//! The administrator is configured once at start-up and is never stored; every
//! other elevated identity lives in the organizer table.

use crate::error::TicketError;
use crate::types::{Identity, Organizer};
use std::sync::Arc;
use ticket_ledger_core::table::TypedTable;

/// The administrator singleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    identity: Identity,
}

impl AdminConfig {
    /// Configure the administrator identity.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::InvalidArgument`] if `identity` is empty.
    pub fn new(identity: Identity) -> Result<Self, TicketError> {
        if identity.as_str().trim().is_empty() {
            return Err(TicketError::InvalidArgument(
                "administrator identity must not be empty".to_string(),
            ));
        }
        Ok(Self { identity })
    }

    /// The administrator identity
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }
}

/// Resolves whether an identity holds organizer rights.
///
/// Cheap to clone; clones read the same organizer table.
#[derive(Debug, Clone)]
pub struct IdentityAuthority {
    admin: Arc<AdminConfig>,
    organizers: TypedTable<Organizer>,
}

impl IdentityAuthority {
    /// Build an authority over the given organizer table
    #[must_use]
    pub fn new(admin: Arc<AdminConfig>, organizers: TypedTable<Organizer>) -> Self {
        Self { admin, organizers }
    }

    /// Whether `identity` is the administrator
    #[must_use]
    pub fn is_admin(&self, identity: &Identity) -> bool {
        self.admin.identity() == identity
    }

    /// True iff `identity` is the administrator or a registered organizer.
    ///
    /// Scans the registry; it is expected to stay small.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Storage`] if the registry cannot be read.
    pub async fn is_authorized(&self, identity: &Identity) -> Result<bool, TicketError> {
        if self.is_admin(identity) {
            return Ok(true);
        }
        let organizers = self.organizers.values().await?;
        Ok(organizers
            .iter()
            .any(|organizer| &organizer.identity == identity))
    }

    /// Fail with `Unauthorized` unless `identity` is authorized.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Unauthorized`] naming `action`, or a storage error.
    pub async fn require_authorized(
        &self,
        identity: &Identity,
        action: &'static str,
    ) -> Result<(), TicketError> {
        if self.is_authorized(identity).await? {
            Ok(())
        } else {
            Err(TicketError::Unauthorized {
                identity: identity.clone(),
                action,
            })
        }
    }
}
