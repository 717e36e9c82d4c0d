//! Domain types for the ticket ledger.
//!
//! Listings, sold-ticket records and organizer entries, plus the identifier
//! newtypes that keep them apart. The state transitions that only touch one
//! record (reserving, counting a sale, restoring inventory) live here as methods
//! so they can be tested without any storage.

use crate::error::TicketError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event-ticket listing
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    /// Wrap an existing identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a sold-ticket record
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoldTicketId(String);

impl SoldTicketId {
    /// Wrap an existing identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SoldTicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sequence number of an organizer registry entry.
///
/// Assigned 1, 2, 3, ... and never reused, even after removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizerSequence(u64);

impl OrganizerSequence {
    /// Wrap a raw sequence number
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw sequence number
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Storage key: zero-padded so that key order equals numeric order
    #[must_use]
    pub fn storage_key(self) -> String {
        format!("{:020}", self.0)
    }
}

impl fmt::Display for OrganizerSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque caller identity supplied by the host for each invocation.
///
/// The ledger never derives or validates identities; it only compares them.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wrap an identity string
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    /// Get the identity as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identity is the empty string
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Listings
// ============================================================================

/// Author-supplied fields for a new listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListingPayload {
    /// Listing title
    pub title: String,
    /// Listing description
    pub description: String,
    /// Price of one ticket (non-negative)
    pub unit_price: f64,
    /// Maximum sellable units; `None` means unbounded
    #[serde(default)]
    pub capacity: Option<u32>,
}

impl ListingPayload {
    /// Check the payload before a listing is created from it.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::InvalidArgument`] if the price is negative or not finite.
    pub fn validate(&self) -> Result<(), TicketError> {
        if !self.unit_price.is_finite() || self.unit_price < 0.0 {
            return Err(TicketError::InvalidArgument(format!(
                "unit price must be a non-negative number, got {}",
                self.unit_price
            )));
        }
        Ok(())
    }
}

/// An event-ticket offering.
///
/// Invariant: `total_sold <= capacity` whenever `capacity` is set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventTicketListing {
    /// Listing ID (immutable)
    pub id: ListingId,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Price of one ticket
    pub unit_price: f64,
    /// Maximum sellable units; `None` means unbounded
    pub capacity: Option<u32>,
    /// Units sold so far
    pub total_sold: u32,
    /// When the listing was created
    pub created_at: DateTime<Utc>,
    /// When the listing was last changed
    pub updated_at: Option<DateTime<Utc>>,
    /// Identity that created the listing
    pub owner: Option<Identity>,
    /// Username currently holding an advisory reservation
    pub reserved_by: Option<String>,
}

impl EventTicketListing {
    /// Build a fresh listing from a validated payload
    #[must_use]
    pub fn new(
        id: ListingId,
        payload: ListingPayload,
        owner: Option<Identity>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: payload.title,
            description: payload.description,
            unit_price: payload.unit_price,
            capacity: payload.capacity,
            total_sold: 0,
            created_at,
            updated_at: None,
            owner,
            reserved_by: None,
        }
    }

    /// Units still available, or `None` for unbounded listings
    #[must_use]
    pub fn remaining(&self) -> Option<u32> {
        self.capacity
            .map(|capacity| capacity.saturating_sub(self.total_sold))
    }

    /// Whether at least one more unit can be sold
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.remaining().is_none_or(|remaining| remaining > 0)
    }

    /// Whether `identity` created this listing
    #[must_use]
    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        self.owner.as_ref() == Some(identity)
    }

    /// Place (or refresh) an advisory reservation for `holder`.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::ReservationConflict`] if another username holds it.
    pub fn reserve(&mut self, holder: &str, now: DateTime<Utc>) -> Result<(), TicketError> {
        self.ensure_not_held_by_other(holder)?;
        self.reserved_by = Some(holder.to_string());
        self.updated_at = Some(now);
        Ok(())
    }

    /// Drop `holder`'s reservation. Releasing an unreserved listing is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::ReservationConflict`] if another username holds it.
    pub fn release(&mut self, holder: &str, now: DateTime<Utc>) -> Result<(), TicketError> {
        self.ensure_not_held_by_other(holder)?;
        if self.reserved_by.take().is_some() {
            self.updated_at = Some(now);
        }
        Ok(())
    }

    /// Fail if a username other than `holder` holds the reservation.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::ReservationConflict`] naming the current holder.
    pub fn ensure_not_held_by_other(&self, holder: &str) -> Result<(), TicketError> {
        match &self.reserved_by {
            Some(current) if current != holder => Err(TicketError::ReservationConflict {
                listing_id: self.id.clone(),
                held_by: current.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Count one sale.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::SoldOut`] if the listing is at capacity.
    pub fn record_sale(&mut self, now: DateTime<Utc>) -> Result<(), TicketError> {
        if !self.is_available() {
            return Err(TicketError::SoldOut {
                listing_id: self.id.clone(),
            });
        }
        self.total_sold += 1;
        self.updated_at = Some(now);
        Ok(())
    }

    /// Give one unit back after a refund (never below zero).
    pub fn record_refund(&mut self, now: DateTime<Utc>) {
        self.total_sold = self.total_sold.saturating_sub(1);
        self.updated_at = Some(now);
    }
}

// ============================================================================
// Sold tickets
// ============================================================================

/// Proof of one purchase against a listing.
///
/// `event_ticket_id` is a weak reference: the listing may have been deleted
/// since, leaving the record orphaned but still valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoldTicketRecord {
    /// Record ID (immutable)
    pub id: SoldTicketId,
    /// Listing the ticket was bought against
    pub event_ticket_id: ListingId,
    /// Display name of the current holder
    pub buyer_username: String,
    /// Identity allowed to resell the ticket
    pub owner: Option<Identity>,
    /// When the purchase happened
    pub purchased_at: DateTime<Utc>,
}

// ============================================================================
// Organizers
// ============================================================================

/// An organizer registry entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organizer {
    /// Sequence number (registry key)
    pub sequence: OrganizerSequence,
    /// Identity granted organizer rights
    pub identity: Identity,
    /// Who added the organizer
    pub added_by: Identity,
    /// When the organizer was added
    pub added_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn listing(capacity: Option<u32>) -> EventTicketListing {
        EventTicketListing::new(
            ListingId::new("listing-1"),
            ListingPayload {
                title: "Concert".to_string(),
                description: "Live".to_string(),
                unit_price: 50.0,
                capacity,
            },
            Some(Identity::new("organizer")),
            Utc::now(),
        )
    }

    #[test]
    fn new_listing_starts_empty() {
        let listing = listing(Some(2));
        assert_eq!(listing.total_sold, 0);
        assert_eq!(listing.updated_at, None);
        assert_eq!(listing.reserved_by, None);
        assert_eq!(listing.remaining(), Some(2));
        assert!(listing.is_owned_by(&Identity::new("organizer")));
    }

    #[test]
    fn sales_stop_at_capacity() {
        let mut listing = listing(Some(1));
        listing.record_sale(Utc::now()).unwrap();
        assert!(!listing.is_available());

        let error = listing.record_sale(Utc::now()).unwrap_err();
        assert!(matches!(error, TicketError::SoldOut { .. }));
        assert_eq!(listing.total_sold, 1);
    }

    #[test]
    fn unbounded_listing_is_always_available() {
        let mut listing = listing(None);
        for _ in 0..100 {
            listing.record_sale(Utc::now()).unwrap();
        }
        assert!(listing.is_available());
        assert_eq!(listing.remaining(), None);
    }

    #[test]
    fn reservation_is_idempotent_for_holder_and_exclusive_otherwise() {
        let mut listing = listing(None);
        listing.reserve("alice", Utc::now()).unwrap();
        listing.reserve("alice", Utc::now()).unwrap();

        let error = listing.reserve("bob", Utc::now()).unwrap_err();
        assert!(matches!(
            error,
            TicketError::ReservationConflict { ref held_by, .. } if held_by == "alice"
        ));
        assert_eq!(listing.reserved_by.as_deref(), Some("alice"));
    }

    #[test]
    fn release_by_other_is_rejected() {
        let mut listing = listing(None);
        listing.reserve("alice", Utc::now()).unwrap();
        assert!(listing.release("bob", Utc::now()).is_err());

        listing.release("alice", Utc::now()).unwrap();
        assert_eq!(listing.reserved_by, None);
        listing.release("bob", Utc::now()).unwrap();
    }

    #[test]
    fn refund_never_goes_below_zero() {
        let mut listing = listing(Some(3));
        listing.record_refund(Utc::now());
        assert_eq!(listing.total_sold, 0);
        assert!(listing.updated_at.is_some());
    }

    #[test]
    fn negative_price_is_invalid() {
        let payload = ListingPayload {
            title: "t".to_string(),
            description: "d".to_string(),
            unit_price: -1.0,
            capacity: None,
        };
        assert!(matches!(
            payload.validate(),
            Err(TicketError::InvalidArgument(_))
        ));

        let nan = ListingPayload {
            unit_price: f64::NAN,
            ..payload
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn organizer_keys_sort_numerically() {
        let mut keys = vec![
            OrganizerSequence::new(10).storage_key(),
            OrganizerSequence::new(2).storage_key(),
            OrganizerSequence::new(1).storage_key(),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                OrganizerSequence::new(1).storage_key(),
                OrganizerSequence::new(2).storage_key(),
                OrganizerSequence::new(10).storage_key(),
            ]
        );
    }
}
