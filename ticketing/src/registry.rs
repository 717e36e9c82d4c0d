//! Organizer registry: admin-managed set of identities with elevated rights.

use crate::authority::{AdminConfig, IdentityAuthority};
use crate::error::TicketError;
use crate::types::{Identity, Organizer, OrganizerSequence};
use std::sync::Arc;
use ticket_ledger_core::environment::Clock;
use ticket_ledger_core::table::{Table, TypedTable};

/// Key of the organizer counter in the sequences table
const ORGANIZER_SEQUENCE_KEY: &str = "organizer";

/// Registry of organizers keyed by sequence number.
///
/// Sequence numbers come from a persisted counter, so they are never reused,
/// not even after the highest entry is removed and the process restarts.
#[derive(Clone)]
pub struct OrganizerRegistry {
    authority: IdentityAuthority,
    organizers: TypedTable<Organizer>,
    sequences: TypedTable<u64>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for OrganizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrganizerRegistry")
            .field("authority", &self.authority)
            .field("sequences", &self.sequences)
            .finish_non_exhaustive()
    }
}

impl OrganizerRegistry {
    /// Build a registry over the organizer and sequence tables
    #[must_use]
    pub fn new(
        admin: Arc<AdminConfig>,
        organizers: Arc<dyn Table>,
        sequences: Arc<dyn Table>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let organizers = TypedTable::new(organizers);
        Self {
            authority: IdentityAuthority::new(admin, organizers.clone()),
            organizers,
            sequences: TypedTable::new(sequences),
            clock,
        }
    }

    /// Authority resolving organizer rights against this registry
    #[must_use]
    pub const fn authority(&self) -> &IdentityAuthority {
        &self.authority
    }

    /// Register `identity` as an organizer.
    ///
    /// The entry is written before the counter advances; if the counter write
    /// fails the entry is removed again, so a failed add leaves no trace.
    ///
    /// # Errors
    ///
    /// - [`TicketError::Unauthorized`] if `requester` is not authorized; the
    ///   counter is left untouched
    /// - [`TicketError::InvalidArgument`] if `identity` is empty or is the
    ///   administrator
    pub async fn add(
        &self,
        requester: &Identity,
        identity: Identity,
    ) -> Result<Organizer, TicketError> {
        self.authority
            .require_authorized(requester, "add organizers")
            .await?;
        if identity.as_str().trim().is_empty() {
            return Err(TicketError::InvalidArgument(
                "organizer identity must not be empty".to_string(),
            ));
        }
        if self.authority.is_admin(&identity) {
            return Err(TicketError::InvalidArgument(
                "the administrator cannot be registered as an organizer".to_string(),
            ));
        }

        let sequence = self.peek_next_sequence().await?;
        let organizer = Organizer {
            sequence,
            identity,
            added_by: requester.clone(),
            added_at: self.clock.now(),
        };
        let key = sequence.storage_key();
        self.organizers.put(&key, &organizer).await?;

        if let Err(error) = self.sequences.put(ORGANIZER_SEQUENCE_KEY, &sequence.value()).await {
            if let Err(cleanup) = self.organizers.remove(&key).await {
                tracing::error!(
                    sequence = %sequence,
                    error = %cleanup,
                    "Failed to roll back organizer entry"
                );
            }
            return Err(error.into());
        }

        tracing::info!(
            sequence = %organizer.sequence,
            organizer = %organizer.identity,
            added_by = %requester,
            "Organizer added"
        );
        Ok(organizer)
    }

    /// Remove the organizer registered under `sequence`.
    ///
    /// # Errors
    ///
    /// - [`TicketError::Unauthorized`] if `requester` is not authorized
    /// - [`TicketError::OrganizerNotFound`] if nothing is registered under `sequence`
    pub async fn remove(
        &self,
        requester: &Identity,
        sequence: OrganizerSequence,
    ) -> Result<Organizer, TicketError> {
        self.authority
            .require_authorized(requester, "remove organizers")
            .await?;

        let removed = self
            .organizers
            .remove(&sequence.storage_key())
            .await?
            .ok_or(TicketError::OrganizerNotFound(sequence))?;

        tracing::info!(
            sequence = %sequence,
            organizer = %removed.identity,
            removed_by = %requester,
            "Organizer removed"
        );
        Ok(removed)
    }

    /// All organizers, in sequence order.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Storage`] if the registry cannot be read.
    pub async fn list(&self) -> Result<Vec<Organizer>, TicketError> {
        Ok(self.organizers.values().await?)
    }

    /// Last sequence number handed out (0 if none yet).
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Storage`] if the counter cannot be read.
    pub async fn last_sequence(&self) -> Result<u64, TicketError> {
        Ok(self
            .sequences
            .get(ORGANIZER_SEQUENCE_KEY)
            .await?
            .unwrap_or(0))
    }

    async fn peek_next_sequence(&self) -> Result<OrganizerSequence, TicketError> {
        let next = self.last_sequence().await?.checked_add(1).ok_or_else(|| {
            TicketError::InvalidArgument("organizer sequence exhausted".to_string())
        })?;
        Ok(OrganizerSequence::new(next))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ticket_ledger_testing::{FlakyTable, InMemoryTable, test_clock};

    fn registry_over(organizers: Arc<dyn Table>, sequences: Arc<dyn Table>) -> OrganizerRegistry {
        let admin = Arc::new(AdminConfig::new(Identity::new("admin")).unwrap());
        OrganizerRegistry::new(admin, organizers, sequences, Arc::new(test_clock()))
    }

    fn registry() -> OrganizerRegistry {
        registry_over(
            Arc::new(InMemoryTable::new("organizers")),
            Arc::new(InMemoryTable::new("ledger_sequences")),
        )
    }

    #[tokio::test]
    async fn admin_adds_organizers_with_increasing_sequences() {
        let registry = registry();
        let admin = Identity::new("admin");

        let first = registry.add(&admin, Identity::new("org-a")).await.unwrap();
        let second = registry.add(&admin, Identity::new("org-b")).await.unwrap();

        assert_eq!(first.sequence, OrganizerSequence::new(1));
        assert_eq!(second.sequence, OrganizerSequence::new(2));
        assert_eq!(registry.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn organizers_may_add_further_organizers() {
        let registry = registry();
        registry
            .add(&Identity::new("admin"), Identity::new("org-a"))
            .await
            .unwrap();

        let added = registry
            .add(&Identity::new("org-a"), Identity::new("org-b"))
            .await
            .unwrap();
        assert_eq!(added.added_by, Identity::new("org-a"));
        assert!(
            registry
                .authority()
                .is_authorized(&Identity::new("org-b"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn unauthorized_add_leaves_counter_untouched() {
        let registry = registry();

        let error = registry
            .add(&Identity::new("stranger"), Identity::new("org-a"))
            .await
            .unwrap_err();

        assert!(matches!(error, TicketError::Unauthorized { .. }));
        assert_eq!(registry.last_sequence().await.unwrap(), 0);
        assert!(registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_identity_is_invalid() {
        let registry = registry();
        let error = registry
            .add(&Identity::new("admin"), Identity::new(""))
            .await
            .unwrap_err();
        assert!(matches!(error, TicketError::InvalidArgument(_)));
        assert_eq!(registry.last_sequence().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sequences_are_not_reused_after_removal() {
        let registry = registry();
        let admin = Identity::new("admin");
        registry.add(&admin, Identity::new("org-a")).await.unwrap();
        registry.add(&admin, Identity::new("org-b")).await.unwrap();

        registry
            .remove(&admin, OrganizerSequence::new(2))
            .await
            .unwrap();
        let next = registry.add(&admin, Identity::new("org-c")).await.unwrap();

        assert_eq!(next.sequence, OrganizerSequence::new(3));
    }

    #[tokio::test]
    async fn removing_unknown_sequence_is_not_found() {
        let registry = registry();
        let error = registry
            .remove(&Identity::new("admin"), OrganizerSequence::new(9))
            .await
            .unwrap_err();
        assert_eq!(
            error,
            TicketError::OrganizerNotFound(OrganizerSequence::new(9))
        );
    }

    #[tokio::test]
    async fn removed_organizer_loses_rights() {
        let registry = registry();
        let admin = Identity::new("admin");
        let organizer = registry.add(&admin, Identity::new("org-a")).await.unwrap();

        registry.remove(&admin, organizer.sequence).await.unwrap();

        assert!(
            !registry
                .authority()
                .is_authorized(&Identity::new("org-a"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn admin_identity_cannot_be_registered() {
        let registry = registry();
        let error = registry
            .add(&Identity::new("admin"), Identity::new("admin"))
            .await
            .unwrap_err();

        assert!(matches!(error, TicketError::InvalidArgument(_)));
        assert_eq!(registry.last_sequence().await.unwrap(), 0);
        assert!(registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_entry_write_keeps_sequence_available() {
        let organizers = FlakyTable::new(InMemoryTable::new("organizers"));
        let registry = registry_over(
            Arc::new(organizers.clone()),
            Arc::new(InMemoryTable::new("ledger_sequences")),
        );
        let admin = Identity::new("admin");

        organizers.fail_inserts(true);
        let error = registry.add(&admin, Identity::new("org-a")).await.unwrap_err();
        assert!(matches!(error, TicketError::Storage(_)));
        assert_eq!(registry.last_sequence().await.unwrap(), 0);

        organizers.fail_inserts(false);
        let added = registry.add(&admin, Identity::new("org-a")).await.unwrap();
        assert_eq!(added.sequence, OrganizerSequence::new(1));
    }

    #[tokio::test]
    async fn failed_counter_write_removes_entry() {
        let sequences = FlakyTable::new(InMemoryTable::new("ledger_sequences"));
        let organizers = InMemoryTable::new("organizers");
        let registry = registry_over(Arc::new(organizers.clone()), Arc::new(sequences.clone()));

        sequences.fail_inserts(true);
        let error = registry
            .add(&Identity::new("admin"), Identity::new("org-a"))
            .await
            .unwrap_err();

        assert!(matches!(error, TicketError::Storage(_)));
        assert!(organizers.keys().is_empty());
        assert_eq!(registry.last_sequence().await.unwrap(), 0);
    }
}
