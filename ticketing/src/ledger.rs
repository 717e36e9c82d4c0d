//! Sold-ticket ledger: owns the records produced by purchases.

use crate::authority::IdentityAuthority;
use crate::catalog::require_username;
use crate::environment::TicketingEnvironment;
use crate::error::TicketError;
use crate::policy::AccessProfile;
use crate::types::{Identity, ListingId, SoldTicketId, SoldTicketRecord};
use std::sync::Arc;
use ticket_ledger_core::table::{Table, TypedTable};

/// Store of [`SoldTicketRecord`]s.
#[derive(Clone)]
pub struct SoldTicketLedger {
    records: TypedTable<SoldTicketRecord>,
    authority: IdentityAuthority,
    env: TicketingEnvironment,
    profile: AccessProfile,
}

impl std::fmt::Debug for SoldTicketLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoldTicketLedger")
            .field("records", &self.records)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl SoldTicketLedger {
    /// Build a ledger over the sold-tickets table
    #[must_use]
    pub fn new(
        records: Arc<dyn Table>,
        authority: IdentityAuthority,
        env: TicketingEnvironment,
        profile: AccessProfile,
    ) -> Self {
        Self {
            records: TypedTable::new(records),
            authority,
            env,
            profile,
        }
    }

    /// Look up a sold-ticket record.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::SoldTicketNotFound`] if absent.
    pub async fn get(&self, id: &SoldTicketId) -> Result<SoldTicketRecord, TicketError> {
        self.records
            .get(id.as_str())
            .await?
            .ok_or_else(|| TicketError::SoldTicketNotFound(id.clone()))
    }

    /// All sold-ticket records, in storage key order.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Storage`] if the table cannot be read.
    pub async fn list(&self) -> Result<Vec<SoldTicketRecord>, TicketError> {
        Ok(self.records.values().await?)
    }

    /// Reassign a ticket to `new_username` and, optionally, a new owner.
    ///
    /// Without `new_owner` the current owner is kept.
    ///
    /// # Errors
    ///
    /// - [`TicketError::SoldTicketNotFound`] if absent
    /// - [`TicketError::Unauthorized`] under ownership-gated profiles if
    ///   `requester` is not the record's owner
    /// - [`TicketError::InvalidArgument`] if `new_username` is empty
    pub async fn resell(
        &self,
        requester: &Identity,
        id: &SoldTicketId,
        new_username: &str,
        new_owner: Option<Identity>,
    ) -> Result<SoldTicketRecord, TicketError> {
        let mut record = self.get(id).await?;
        if self.profile.gates_by_ownership() && record.owner.as_ref() != Some(requester) {
            return Err(TicketError::Unauthorized {
                identity: requester.clone(),
                action: "resell a ticket it does not own",
            });
        }
        require_username(new_username)?;

        record.buyer_username = new_username.to_string();
        if let Some(owner) = new_owner {
            record.owner = Some(owner);
        }
        self.records.put(id.as_str(), &record).await?;

        tracing::info!(
            ticket_id = %id,
            buyer = %record.buyer_username,
            owner = ?record.owner,
            "Ticket resold"
        );
        Ok(record)
    }

    /// Reassign only the buyer username. No ownership check.
    ///
    /// # Errors
    ///
    /// - [`TicketError::SoldTicketNotFound`] if absent
    /// - [`TicketError::InvalidArgument`] if `new_username` is empty
    pub async fn transfer(
        &self,
        id: &SoldTicketId,
        new_username: &str,
    ) -> Result<SoldTicketId, TicketError> {
        let mut record = self.get(id).await?;
        require_username(new_username)?;

        record.buyer_username = new_username.to_string();
        self.records.put(id.as_str(), &record).await?;

        tracing::info!(ticket_id = %id, buyer = new_username, "Ticket transferred");
        Ok(record.id)
    }

    /// Fail with `Forbidden` if the profile bars `requester` from buying.
    pub(crate) async fn check_purchaser(&self, requester: &Identity) -> Result<(), TicketError> {
        if self.profile.forbids_organizer_purchase()
            && self.authority.is_authorized(requester).await?
        {
            return Err(TicketError::Forbidden {
                identity: requester.clone(),
                action: "purchase tickets as an organizer",
            });
        }
        Ok(())
    }

    /// Persist a new record for a purchase against `listing_id`.
    pub(crate) async fn record_purchase(
        &self,
        requester: &Identity,
        listing_id: &ListingId,
        buyer_username: &str,
    ) -> Result<SoldTicketRecord, TicketError> {
        let record = SoldTicketRecord {
            id: SoldTicketId::new(self.env.ids.next_id()),
            event_ticket_id: listing_id.clone(),
            buyer_username: buyer_username.to_string(),
            owner: Some(requester.clone()),
            purchased_at: self.env.clock.now(),
        };
        self.records.put(record.id.as_str(), &record).await?;
        Ok(record)
    }

    /// Remove a record, returning it.
    pub(crate) async fn remove(&self, id: &SoldTicketId) -> Result<SoldTicketRecord, TicketError> {
        self.records
            .remove(id.as_str())
            .await?
            .ok_or_else(|| TicketError::SoldTicketNotFound(id.clone()))
    }

    /// Write a record back unchanged (compensation for a failed refund).
    pub(crate) async fn reinstate(&self, record: &SoldTicketRecord) -> Result<(), TicketError> {
        self.records.put(record.id.as_str(), record).await?;
        Ok(())
    }
}
