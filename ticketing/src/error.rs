//! Typed failures returned by every ledger operation.

use crate::types::{Identity, ListingId, OrganizerSequence, SoldTicketId};
use thiserror::Error;
use ticket_ledger_core::table::TableError;

/// Failure category callers can branch on.
///
/// This is the coarse taxonomy exposed at the API boundary; [`TicketError`]
/// carries the detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced id is absent
    NotFound,
    /// The caller lacks the required role or ownership
    Unauthorized,
    /// The caller's role excludes it from this operation
    Forbidden,
    /// Competing reservation or exhausted capacity
    Conflict,
    /// Malformed input
    InvalidArgument,
    /// The storage substrate failed
    Internal,
}

impl ErrorKind {
    /// Stable label used in metrics and response bodies
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::InvalidArgument => "invalid_argument",
            Self::Internal => "internal",
        }
    }
}

/// Errors raised by the ticket ledger.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TicketError {
    /// No listing with this id
    #[error("Listing not found: {0}")]
    ListingNotFound(ListingId),

    /// No sold-ticket record with this id
    #[error("Sold ticket not found: {0}")]
    SoldTicketNotFound(SoldTicketId),

    /// No organizer registered under this sequence number
    #[error("Organizer not found: {0}")]
    OrganizerNotFound(OrganizerSequence),

    /// Caller is neither authorized by role nor the owner of the record
    #[error("{identity} is not allowed to {action}")]
    Unauthorized {
        /// Who tried
        identity: Identity,
        /// What they tried to do
        action: &'static str,
    },

    /// Caller's role excludes it from the operation
    #[error("{identity} may not {action}")]
    Forbidden {
        /// Who tried
        identity: Identity,
        /// What they tried to do
        action: &'static str,
    },

    /// Another username holds the listing's reservation
    #[error("Listing {listing_id} is reserved by {held_by}")]
    ReservationConflict {
        /// Reserved listing
        listing_id: ListingId,
        /// Current holder
        held_by: String,
    },

    /// The listing has no capacity left
    #[error("Listing {listing_id} is sold out")]
    SoldOut {
        /// Exhausted listing
        listing_id: ListingId,
    },

    /// Malformed input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Storage substrate failure
    #[error(transparent)]
    Storage(#[from] TableError),
}

impl TicketError {
    /// Map onto the caller-facing taxonomy
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ListingNotFound(_) | Self::SoldTicketNotFound(_) | Self::OrganizerNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::ReservationConflict { .. } | Self::SoldOut { .. } => ErrorKind::Conflict,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Storage(_) => ErrorKind::Internal,
        }
    }
}
