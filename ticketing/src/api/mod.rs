//! API endpoints for the ticket ledger.
//!
//! Handlers are grouped by resource:
//! - Listings: catalog, availability, reservations and purchase
//! - Tickets: sold-ticket records, resale, transfer and refund
//! - Organizers: registry management and authorization checks

pub mod error;
pub mod extract;
pub mod identity;
pub mod listings;
pub mod organizers;
pub mod tickets;

pub use error::ApiError;
pub use extract::{JsonBody, PathParam, QueryParams};
pub use identity::{CALLER_IDENTITY_HEADER, CallerIdentity};
