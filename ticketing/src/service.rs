//! Ticket service: the external API of the ledger.
//!
//! Composes the organizer registry, the catalog and the sold-ticket ledger, and
//! is the only place where the listing sold counter moves together with a
//! sold-ticket record. All operations run one at a time under an async mutex,
//! so the intermediate state of a two-step write (record inserted, counter not
//! yet incremented) is never observed by another operation.

use crate::authority::{AdminConfig, IdentityAuthority};
use crate::catalog::{TicketCatalog, require_username};
use crate::environment::{LedgerTables, TicketingEnvironment};
use crate::error::TicketError;
use crate::ledger::SoldTicketLedger;
use crate::metrics;
use crate::policy::ServicePolicy;
use crate::registry::OrganizerRegistry;
use crate::types::{
    EventTicketListing, Identity, ListingId, ListingPayload, Organizer, OrganizerSequence,
    SoldTicketId, SoldTicketRecord,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Orchestrator over registry, catalog and ledger.
#[derive(Debug)]
pub struct TicketService {
    registry: OrganizerRegistry,
    catalog: TicketCatalog,
    ledger: SoldTicketLedger,
    policy: ServicePolicy,
    gate: Mutex<()>,
}

impl TicketService {
    /// Wire up the components over `tables`.
    #[must_use]
    pub fn new(
        admin: AdminConfig,
        tables: LedgerTables,
        env: TicketingEnvironment,
        policy: ServicePolicy,
    ) -> Self {
        let registry = OrganizerRegistry::new(
            Arc::new(admin),
            tables.organizers,
            tables.sequences,
            Arc::clone(&env.clock),
        );
        let authority: IdentityAuthority = registry.authority().clone();
        let catalog = TicketCatalog::new(
            tables.listings,
            authority.clone(),
            env.clone(),
            policy.profile,
        );
        let ledger = SoldTicketLedger::new(tables.sold_tickets, authority, env, policy.profile);

        tracing::info!(
            profile = %policy.profile,
            enforce_reservations = policy.enforce_reservations,
            restore_inventory_on_refund = policy.restore_inventory_on_refund,
            "Ticket service initialized"
        );

        Self {
            registry,
            catalog,
            ledger,
            policy,
            gate: Mutex::new(()),
        }
    }

    /// Behavioural switches in effect
    #[must_use]
    pub const fn policy(&self) -> &ServicePolicy {
        &self.policy
    }

    // ========================================================================
    // Listings
    // ========================================================================

    /// All listings.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Storage`] if the listings cannot be read.
    #[tracing::instrument(skip_all)]
    pub async fn list_listings(&self) -> Result<Vec<EventTicketListing>, TicketError> {
        let _turn = self.gate.lock().await;
        observe("list_listings", self.catalog.list().await)
    }

    /// Create a listing.
    ///
    /// # Errors
    ///
    /// `Unauthorized` under role-gated profiles, `InvalidArgument` for a bad price.
    #[tracing::instrument(skip_all, fields(requester = %requester, title = %payload.title))]
    pub async fn create_listing(
        &self,
        requester: &Identity,
        payload: ListingPayload,
    ) -> Result<EventTicketListing, TicketError> {
        let _turn = self.gate.lock().await;
        let listing = observe(
            "create_listing",
            self.catalog.create(requester, payload).await,
        )?;
        metrics::record_listing_created();
        Ok(listing)
    }

    /// Look up a listing.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent.
    #[tracing::instrument(skip_all, fields(listing_id = %id))]
    pub async fn get_listing(&self, id: &ListingId) -> Result<EventTicketListing, TicketError> {
        let _turn = self.gate.lock().await;
        observe("get_listing", self.catalog.get(id).await)
    }

    /// Delete a listing, leaving its sold-ticket records orphaned.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `Unauthorized` per the access profile.
    #[tracing::instrument(skip_all, fields(requester = %requester, listing_id = %id))]
    pub async fn delete_listing(
        &self,
        requester: &Identity,
        id: &ListingId,
    ) -> Result<EventTicketListing, TicketError> {
        let _turn = self.gate.lock().await;
        let listing = observe("delete_listing", self.catalog.delete(requester, id).await)?;
        metrics::record_listing_deleted();
        Ok(listing)
    }

    /// Whether another unit of the listing can be sold.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent.
    #[tracing::instrument(skip_all, fields(listing_id = %id))]
    pub async fn check_availability(&self, id: &ListingId) -> Result<bool, TicketError> {
        let _turn = self.gate.lock().await;
        observe(
            "check_availability",
            self.catalog.check_availability(id).await,
        )
    }

    /// Reserve a listing for `username`.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `Conflict` if another username holds it.
    #[tracing::instrument(skip_all, fields(listing_id = %id, username = %username))]
    pub async fn reserve_ticket(
        &self,
        id: &ListingId,
        username: &str,
    ) -> Result<ListingId, TicketError> {
        let _turn = self.gate.lock().await;
        let id = observe("reserve_ticket", self.catalog.reserve(id, username).await)?;
        metrics::record_reservation("placed");
        Ok(id)
    }

    /// Release `username`'s reservation on a listing.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `Conflict` if another username holds it.
    #[tracing::instrument(skip_all, fields(listing_id = %id, username = %username))]
    pub async fn release_reservation(
        &self,
        id: &ListingId,
        username: &str,
    ) -> Result<ListingId, TicketError> {
        let _turn = self.gate.lock().await;
        let id = observe(
            "release_reservation",
            self.catalog.release_reservation(id, username).await,
        )?;
        metrics::record_reservation("released");
        Ok(id)
    }

    // ========================================================================
    // Sold tickets
    // ========================================================================

    /// Look up a sold-ticket record.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent.
    #[tracing::instrument(skip_all, fields(ticket_id = %id))]
    pub async fn get_sold_record(&self, id: &SoldTicketId) -> Result<SoldTicketRecord, TicketError> {
        let _turn = self.gate.lock().await;
        observe("get_sold_record", self.ledger.get(id).await)
    }

    /// All sold-ticket records.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Storage`] if the records cannot be read.
    #[tracing::instrument(skip_all)]
    pub async fn list_sold_records(&self) -> Result<Vec<SoldTicketRecord>, TicketError> {
        let _turn = self.gate.lock().await;
        observe("list_sold_records", self.ledger.list().await)
    }

    /// Buy one ticket of a listing for `username`.
    ///
    /// The record insert and the sold-count increment form one unit: if the
    /// increment fails, the record is removed again before the error returns.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if organizers may not buy under the access profile
    /// - `NotFound` if the listing is absent
    /// - `Conflict` if the listing is sold out, or reserved by someone else
    ///   while reservations are enforced
    #[tracing::instrument(skip_all, fields(requester = %requester, listing_id = %listing_id, username = %username))]
    pub async fn purchase_ticket(
        &self,
        requester: &Identity,
        listing_id: &ListingId,
        username: &str,
    ) -> Result<SoldTicketRecord, TicketError> {
        let _turn = self.gate.lock().await;
        let record = observe(
            "purchase_ticket",
            self.purchase(requester, listing_id, username).await,
        )?;
        metrics::record_ticket_sold();
        Ok(record)
    }

    async fn purchase(
        &self,
        requester: &Identity,
        listing_id: &ListingId,
        username: &str,
    ) -> Result<SoldTicketRecord, TicketError> {
        self.ledger.check_purchaser(requester).await?;
        require_username(username)?;

        let listing = self.catalog.get(listing_id).await?;
        if !listing.is_available() {
            return Err(TicketError::SoldOut {
                listing_id: listing.id,
            });
        }
        let consume_reservation = if self.policy.enforce_reservations {
            listing.ensure_not_held_by_other(username)?;
            listing.reserved_by.as_deref().map(|_| username)
        } else {
            None
        };

        let record = self
            .ledger
            .record_purchase(requester, listing_id, username)
            .await?;

        match self
            .catalog
            .increment_sold(listing_id, consume_reservation)
            .await
        {
            Ok(listing) => {
                tracing::info!(
                    ticket_id = %record.id,
                    total_sold = listing.total_sold,
                    "Ticket purchased"
                );
                Ok(record)
            }
            Err(error) => {
                if let Err(cleanup) = self.ledger.remove(&record.id).await {
                    tracing::error!(
                        ticket_id = %record.id,
                        error = %cleanup,
                        "Failed to roll back sold-ticket record"
                    );
                }
                tracing::warn!(error = %error, "Purchase rolled back");
                Err(error)
            }
        }
    }

    /// Resell a ticket.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `Unauthorized` if the caller is not the owner
    /// under ownership-gated profiles.
    #[tracing::instrument(skip_all, fields(requester = %requester, ticket_id = %id, username = %username))]
    pub async fn resell_ticket(
        &self,
        requester: &Identity,
        id: &SoldTicketId,
        username: &str,
        new_owner: Option<Identity>,
    ) -> Result<SoldTicketRecord, TicketError> {
        let _turn = self.gate.lock().await;
        let record = observe(
            "resell_ticket",
            self.ledger.resell(requester, id, username, new_owner).await,
        )?;
        metrics::record_ticket_resold("resell");
        Ok(record)
    }

    /// Hand a ticket to another username.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent.
    #[tracing::instrument(skip_all, fields(ticket_id = %id, username = %username))]
    pub async fn transfer_ticket(
        &self,
        id: &SoldTicketId,
        username: &str,
    ) -> Result<SoldTicketId, TicketError> {
        let _turn = self.gate.lock().await;
        let id = observe("transfer_ticket", self.ledger.transfer(id, username).await)?;
        metrics::record_ticket_resold("transfer");
        Ok(id)
    }

    /// Refund a ticket: remove its record and, unless disabled, give the unit
    /// back to the listing. Orphaned records refund without touching inventory.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent.
    #[tracing::instrument(skip_all, fields(ticket_id = %id))]
    pub async fn refund_ticket(&self, id: &SoldTicketId) -> Result<SoldTicketId, TicketError> {
        let _turn = self.gate.lock().await;
        let restored = observe("refund_ticket", self.refund(id).await)?;
        metrics::record_ticket_refunded(restored);
        Ok(id.clone())
    }

    async fn refund(&self, id: &SoldTicketId) -> Result<bool, TicketError> {
        let record = self.ledger.remove(id).await?;
        if !self.policy.restore_inventory_on_refund {
            return Ok(false);
        }

        match self.catalog.decrement_sold(&record.event_ticket_id).await {
            Ok(listing) => {
                tracing::info!(
                    listing_id = %listing.id,
                    total_sold = listing.total_sold,
                    "Refund restored inventory"
                );
                Ok(true)
            }
            Err(TicketError::ListingNotFound(listing_id)) => {
                tracing::info!(%listing_id, "Refunded ticket of a deleted listing");
                Ok(false)
            }
            Err(error) => {
                if let Err(cleanup) = self.ledger.reinstate(&record).await {
                    tracing::error!(
                        ticket_id = %record.id,
                        error = %cleanup,
                        "Failed to reinstate sold-ticket record"
                    );
                }
                tracing::warn!(error = %error, "Refund rolled back");
                Err(error)
            }
        }
    }

    // ========================================================================
    // Organizers
    // ========================================================================

    /// Whether `identity` is the admin or a registered organizer.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Storage`] if the registry cannot be read.
    #[tracing::instrument(skip_all, fields(identity = %identity))]
    pub async fn is_authorized(&self, identity: &Identity) -> Result<bool, TicketError> {
        let _turn = self.gate.lock().await;
        observe(
            "is_authorized",
            self.registry.authority().is_authorized(identity).await,
        )
    }

    /// All registered organizers, in sequence order.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Storage`] if the registry cannot be read.
    #[tracing::instrument(skip_all)]
    pub async fn list_organizers(&self) -> Result<Vec<Organizer>, TicketError> {
        let _turn = self.gate.lock().await;
        observe("list_organizers", self.registry.list().await)
    }

    /// Grant organizer rights to `identity`.
    ///
    /// # Errors
    ///
    /// `Unauthorized` if the caller lacks rights, `InvalidArgument` if
    /// `identity` is empty.
    #[tracing::instrument(skip_all, fields(requester = %requester, organizer = %identity))]
    pub async fn add_organizer(
        &self,
        requester: &Identity,
        identity: Identity,
    ) -> Result<Organizer, TicketError> {
        let _turn = self.gate.lock().await;
        let organizer = observe("add_organizer", self.registry.add(requester, identity).await)?;
        metrics::record_organizer("added");
        Ok(organizer)
    }

    /// Revoke the organizer registered under `sequence`.
    ///
    /// # Errors
    ///
    /// `Unauthorized` if the caller lacks rights, `NotFound` if absent.
    #[tracing::instrument(skip_all, fields(requester = %requester, sequence = %sequence))]
    pub async fn remove_organizer(
        &self,
        requester: &Identity,
        sequence: OrganizerSequence,
    ) -> Result<Organizer, TicketError> {
        let _turn = self.gate.lock().await;
        let organizer = observe(
            "remove_organizer",
            self.registry.remove(requester, sequence).await,
        )?;
        metrics::record_organizer("removed");
        Ok(organizer)
    }
}

/// Count and log failures on their way out.
fn observe<T>(operation: &'static str, result: Result<T, TicketError>) -> Result<T, TicketError> {
    if let Err(error) = &result {
        let kind = error.kind();
        metrics::record_operation_failure(operation, kind);
        if kind == crate::error::ErrorKind::Internal {
            tracing::error!(operation, error = %error, "Ledger operation failed");
        } else {
            tracing::debug!(operation, error = %error, "Ledger operation rejected");
        }
    }
    result
}
