//! Ticket catalog: owns event-ticket listings.
//!
//! Creation, lookup, enumeration, deletion, availability and reservations. The
//! sold counter is only moved by [`TicketService`](crate::service::TicketService)
//! through the crate-private `increment_sold` / `decrement_sold`.

use crate::authority::IdentityAuthority;
use crate::environment::TicketingEnvironment;
use crate::error::TicketError;
use crate::policy::AccessProfile;
use crate::types::{EventTicketListing, Identity, ListingId, ListingPayload};
use std::sync::Arc;
use ticket_ledger_core::table::{Table, TypedTable};

/// Store of [`EventTicketListing`]s.
#[derive(Clone)]
pub struct TicketCatalog {
    listings: TypedTable<EventTicketListing>,
    authority: IdentityAuthority,
    env: TicketingEnvironment,
    profile: AccessProfile,
}

impl std::fmt::Debug for TicketCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketCatalog")
            .field("listings", &self.listings)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl TicketCatalog {
    /// Build a catalog over the listings table
    #[must_use]
    pub fn new(
        listings: Arc<dyn Table>,
        authority: IdentityAuthority,
        env: TicketingEnvironment,
        profile: AccessProfile,
    ) -> Self {
        Self {
            listings: TypedTable::new(listings),
            authority,
            env,
            profile,
        }
    }

    /// Create a listing owned by `requester`.
    ///
    /// # Errors
    ///
    /// - [`TicketError::Unauthorized`] under role-gated profiles if `requester`
    ///   is neither admin nor organizer
    /// - [`TicketError::InvalidArgument`] if the price is negative or not finite
    pub async fn create(
        &self,
        requester: &Identity,
        payload: ListingPayload,
    ) -> Result<EventTicketListing, TicketError> {
        if self.profile.gates_by_role() {
            self.authority
                .require_authorized(requester, "create listings")
                .await?;
        }
        payload.validate()?;

        let id = ListingId::new(self.env.ids.next_id());
        let listing =
            EventTicketListing::new(id, payload, Some(requester.clone()), self.env.clock.now());
        self.listings.put(listing.id.as_str(), &listing).await?;

        tracing::info!(
            listing_id = %listing.id,
            owner = %requester,
            capacity = ?listing.capacity,
            "Listing created"
        );
        Ok(listing)
    }

    /// Look up a listing.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::ListingNotFound`] if absent.
    pub async fn get(&self, id: &ListingId) -> Result<EventTicketListing, TicketError> {
        self.listings
            .get(id.as_str())
            .await?
            .ok_or_else(|| TicketError::ListingNotFound(id.clone()))
    }

    /// All listings, in storage key order.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Storage`] if the table cannot be read.
    pub async fn list(&self) -> Result<Vec<EventTicketListing>, TicketError> {
        Ok(self.listings.values().await?)
    }

    /// Delete a listing and return it.
    ///
    /// Sold-ticket records referencing it are left in place.
    ///
    /// # Errors
    ///
    /// - [`TicketError::ListingNotFound`] if absent
    /// - [`TicketError::Unauthorized`] if the profile gates by role and
    ///   `requester` is not authorized, or gates by ownership and `requester`
    ///   is not the owner
    pub async fn delete(
        &self,
        requester: &Identity,
        id: &ListingId,
    ) -> Result<EventTicketListing, TicketError> {
        let listing = self.get(id).await?;

        if self.profile.gates_by_role() {
            self.authority
                .require_authorized(requester, "delete listings")
                .await?;
        }
        if self.profile.gates_by_ownership() && !listing.is_owned_by(requester) {
            return Err(TicketError::Unauthorized {
                identity: requester.clone(),
                action: "delete a listing it does not own",
            });
        }

        self.listings.remove(id.as_str()).await?;
        tracing::info!(listing_id = %id, deleted_by = %requester, "Listing deleted");
        Ok(listing)
    }

    /// Whether at least one more unit can be sold.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::ListingNotFound`] if absent.
    pub async fn check_availability(&self, id: &ListingId) -> Result<bool, TicketError> {
        Ok(self.get(id).await?.is_available())
    }

    /// Place an advisory reservation for `holder`.
    ///
    /// Repeating the call for the same holder succeeds again.
    ///
    /// # Errors
    ///
    /// - [`TicketError::ListingNotFound`] if absent
    /// - [`TicketError::ReservationConflict`] if another username holds it
    /// - [`TicketError::InvalidArgument`] if `holder` is empty
    pub async fn reserve(&self, id: &ListingId, holder: &str) -> Result<ListingId, TicketError> {
        require_username(holder)?;
        let mut listing = self.get(id).await?;
        listing.reserve(holder, self.env.clock.now())?;
        self.listings.put(id.as_str(), &listing).await?;

        tracing::debug!(listing_id = %id, holder, "Listing reserved");
        Ok(listing.id)
    }

    /// Drop `holder`'s reservation; a no-op when nothing is held.
    ///
    /// # Errors
    ///
    /// - [`TicketError::ListingNotFound`] if absent
    /// - [`TicketError::ReservationConflict`] if another username holds it
    pub async fn release_reservation(
        &self,
        id: &ListingId,
        holder: &str,
    ) -> Result<ListingId, TicketError> {
        let mut listing = self.get(id).await?;
        if listing.reserved_by.is_none() {
            return Ok(listing.id);
        }
        listing.release(holder, self.env.clock.now())?;
        self.listings.put(id.as_str(), &listing).await?;

        tracing::debug!(listing_id = %id, holder, "Reservation released");
        Ok(listing.id)
    }

    /// Count one sale against the listing, optionally consuming `holder`'s
    /// reservation in the same write.
    pub(crate) async fn increment_sold(
        &self,
        id: &ListingId,
        consume_reservation_of: Option<&str>,
    ) -> Result<EventTicketListing, TicketError> {
        let mut listing = self.get(id).await?;
        let now = self.env.clock.now();
        listing.record_sale(now)?;
        if let Some(holder) = consume_reservation_of {
            listing.release(holder, now)?;
        }
        self.listings.put(id.as_str(), &listing).await?;
        Ok(listing)
    }

    /// Give one unit back to the listing.
    pub(crate) async fn decrement_sold(
        &self,
        id: &ListingId,
    ) -> Result<EventTicketListing, TicketError> {
        let mut listing = self.get(id).await?;
        listing.record_refund(self.env.clock.now());
        self.listings.put(id.as_str(), &listing).await?;
        Ok(listing)
    }
}

/// Usernames are free text but must not be blank.
pub(crate) fn require_username(username: &str) -> Result<(), TicketError> {
    if username.trim().is_empty() {
        return Err(TicketError::InvalidArgument(
            "username must not be empty".to_string(),
        ));
    }
    Ok(())
}
