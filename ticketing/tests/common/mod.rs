//! Shared harness for ticketing integration tests.
//!
//! Builds a `TicketService` over in-memory tables, keeping handles on the
//! tables so tests can inspect what was written and inject storage faults.

#![allow(dead_code)]
#![allow(clippy::expect_used)]

use std::sync::Arc;
use ticket_ledger_testing::{
    FixedClock, FlakyTable, InMemoryTable, SequentialIdGenerator, init_test_tracing, test_clock,
};
use ticketing::{
    AdminConfig, Identity, LedgerTables, ListingPayload, ServicePolicy, TicketService,
    TicketingEnvironment,
};

/// Administrator identity used by every harness
pub const ADMIN: &str = "admin";

/// A service plus handles on everything it writes to.
pub struct Harness {
    pub service: TicketService,
    pub listings: FlakyTable<InMemoryTable>,
    pub sold_tickets: FlakyTable<InMemoryTable>,
    pub organizers: InMemoryTable,
    pub sequences: InMemoryTable,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    /// Fresh ledger with the given policy
    pub fn new(policy: ServicePolicy) -> Self {
        init_test_tracing();

        let listings = FlakyTable::new(InMemoryTable::new("ticket_listings"));
        let sold_tickets = FlakyTable::new(InMemoryTable::new("sold_tickets"));
        let organizers = InMemoryTable::new("organizers");
        let sequences = InMemoryTable::new("ledger_sequences");
        let clock = Arc::new(test_clock());

        let tables = LedgerTables {
            listings: Arc::new(listings.clone()),
            sold_tickets: Arc::new(sold_tickets.clone()),
            organizers: Arc::new(organizers.clone()),
            sequences: Arc::new(sequences.clone()),
        };
        let env = TicketingEnvironment::new(
            clock.clone(),
            Arc::new(SequentialIdGenerator::new("id")),
        );
        let admin = AdminConfig::new(Identity::new(ADMIN)).expect("admin identity");

        Self {
            service: TicketService::new(admin, tables, env, policy),
            listings,
            sold_tickets,
            organizers,
            sequences,
            clock,
        }
    }

    /// Register `identity` as an organizer, acting as the admin
    pub async fn add_organizer(&self, identity: &str) {
        self.service
            .add_organizer(&admin(), Identity::new(identity))
            .await
            .expect("admin adds organizer");
    }
}

/// The administrator identity
pub fn admin() -> Identity {
    Identity::new(ADMIN)
}

/// A concert listing priced at 50
pub fn concert(capacity: Option<u32>) -> ListingPayload {
    ListingPayload {
        title: "Concert".to_string(),
        description: "Live in the park".to_string(),
        unit_price: 50.0,
        capacity,
    }
}
