//! # Ticket Ledger Testing
//!
//! Testing utilities for the ticket ledger.
//!
//! This crate provides:
//! - Deterministic environment doubles ([`FixedClock`], [`SequentialIdGenerator`])
//! - In-memory storage ([`InMemoryTable`]) and fault injection ([`FlakyTable`])
//! - A one-line tracing setup for tests that want log output
//!
//! ## Example
//!
//! ```ignore
//! use ticket_ledger_testing::{test_clock, InMemoryTable, SequentialIdGenerator};
//!
//! #[tokio::test]
//! async fn purchase_flow() {
//!     let tables = LedgerTables {
//!         listings: Arc::new(InMemoryTable::new("ticket_listings")),
//!         sold_tickets: Arc::new(InMemoryTable::new("sold_tickets")),
//!         organizers: Arc::new(InMemoryTable::new("organizers")),
//!         sequences: Arc::new(InMemoryTable::new("ledger_sequences")),
//!     };
//!     let env = TicketingEnvironment::new(
//!         Arc::new(test_clock()),
//!         Arc::new(SequentialIdGenerator::new("id")),
//!     );
//!     let service = TicketService::new(admin, tables, env, ServicePolicy::default());
//!     // ...
//! }
//! ```

pub mod mocks;
pub mod tables;

// Re-export commonly used items
pub use mocks::{FixedClock, SequentialIdGenerator, test_clock};
pub use tables::{FlakyTable, InMemoryTable};

/// Install a test-friendly tracing subscriber.
///
/// Safe to call from many tests: only the first call installs the subscriber.
/// Honors `RUST_LOG`, defaulting to `debug` for the ledger crates.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ticketing=debug,ticket_ledger=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
