//! # Ticket Ledger Core
//!
//! Environment traits and the storage abstraction shared by every ticket ledger crate.
//!
//! The ledger itself lives in the `ticketing` crate. This crate only describes the
//! collaborators the ledger depends on but does not own:
//!
//! - **Clock**: wall-clock time for `created_at` / `updated_at` stamps
//! - **`IdGenerator`**: statistically unique identifiers for listings and sold tickets
//! - **Table**: an ordered, durable key-value table (the storage substrate)
//!
//! Production implementations (`SystemClock`, `UuidGenerator`) are provided here,
//! the `PostgreSQL` table lives in `ticket-ledger-postgres` and deterministic doubles
//! live in `ticket-ledger-testing`.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ticket_ledger_core::table::{Table, TypedTable};
//!
//! async fn load(table: Arc<dyn Table>) -> Result<(), TableError> {
//!     let listings: TypedTable<Listing> = TypedTable::new(table);
//!     let all = listings.values().await?;
//!     Ok(())
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub mod environment;
pub mod table;

pub use environment::{Clock, IdGenerator, SystemClock, UuidGenerator};
pub use table::{Table, TableError, TypedTable};
