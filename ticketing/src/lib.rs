//! Ticket issuance and resale ledger.
//!
//! Keeps an inventory of event-ticket listings, records which listings were
//! purchased, and enforces who may create, delete, buy, reserve, resell,
//! transfer or refund each record.
//!
//! # Components
//!
//! ```text
//!                    ┌─────────────────┐
//!                    │  TicketService  │  one operation at a time
//!                    └────────┬────────┘
//!           ┌─────────────────┼──────────────────┐
//!           ▼                 ▼                  ▼
//!  ┌─────────────────┐ ┌──────────────┐ ┌──────────────────┐
//!  │OrganizerRegistry│ │TicketCatalog │ │ SoldTicketLedger │
//!  └────────┬────────┘ └──────┬───────┘ └────────┬─────────┘
//!           └────── IdentityAuthority ───────────┘
//! ```
//!
//! - [`IdentityAuthority`]: is this identity the admin or an organizer?
//! - [`OrganizerRegistry`]: admin-managed organizer set with never-reused sequence numbers
//! - [`TicketCatalog`]: listings, availability and advisory reservations
//! - [`SoldTicketLedger`]: sold-ticket records, resale and transfer
//! - [`TicketService`]: the external API; keeps the sold counter and the records in step
//!
//! Who may do what is decided by the [`AccessProfile`] the service is built with.
//!
//! # Example
//!
//! ```ignore
//! use ticketing::{AdminConfig, Identity, ListingPayload, ServicePolicy, TicketService};
//!
//! let service = TicketService::new(admin, tables, env, ServicePolicy::default());
//! let listing = service
//!     .create_listing(&Identity::new("admin"), ListingPayload {
//!         title: "Concert".into(),
//!         description: "Open air".into(),
//!         unit_price: 50.0,
//!         capacity: Some(100),
//!     })
//!     .await?;
//! let ticket = service
//!     .purchase_ticket(&Identity::new("fan"), &listing.id, "alice")
//!     .await?;
//! ```

pub mod api;
pub mod authority;
pub mod catalog;
pub mod config;
pub mod environment;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod policy;
pub mod registry;
pub mod server;
pub mod service;
pub mod types;

pub use authority::{AdminConfig, IdentityAuthority};
pub use catalog::TicketCatalog;
pub use config::{Config, ConfigError};
pub use environment::{LedgerTables, TicketingEnvironment};
pub use error::{ErrorKind, TicketError};
pub use ledger::SoldTicketLedger;
pub use policy::{AccessProfile, ServicePolicy};
pub use registry::OrganizerRegistry;
pub use service::TicketService;
pub use types::{
    EventTicketListing, Identity, ListingId, ListingPayload, Organizer, OrganizerSequence,
    SoldTicketId, SoldTicketRecord,
};
