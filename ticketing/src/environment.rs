//! Injected collaborators: time, identifiers and the ledger's tables.

use std::sync::Arc;
use ticket_ledger_core::environment::{Clock, IdGenerator, SystemClock, UuidGenerator};
use ticket_ledger_core::table::{Table, TableError};

/// Table holding event-ticket listings, keyed by listing id
pub const LISTINGS_TABLE: &str = "ticket_listings";
/// Table holding sold-ticket records, keyed by record id
pub const SOLD_TICKETS_TABLE: &str = "sold_tickets";
/// Table holding organizer entries, keyed by zero-padded sequence number
pub const ORGANIZERS_TABLE: &str = "organizers";
/// Table holding monotonically increasing counters
pub const SEQUENCES_TABLE: &str = "ledger_sequences";

/// Time and identifier sources used by the ledger components.
#[derive(Clone)]
pub struct TicketingEnvironment {
    /// Clock for `created_at` / `updated_at` stamps
    pub clock: Arc<dyn Clock>,
    /// Source of listing and sold-ticket ids
    pub ids: Arc<dyn IdGenerator>,
}

impl TicketingEnvironment {
    /// Create an environment from explicit collaborators
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { clock, ids }
    }

    /// System clock and UUID v4 identifiers
    #[must_use]
    pub fn production() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(UuidGenerator))
    }
}

impl std::fmt::Debug for TicketingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketingEnvironment")
            .field("clock", &"dyn Clock")
            .field("ids", &"dyn IdGenerator")
            .finish()
    }
}

/// The four tables the ledger persists to.
#[derive(Clone)]
pub struct LedgerTables {
    /// Listings table
    pub listings: Arc<dyn Table>,
    /// Sold-ticket records table
    pub sold_tickets: Arc<dyn Table>,
    /// Organizer registry table
    pub organizers: Arc<dyn Table>,
    /// Sequence counters table
    pub sequences: Arc<dyn Table>,
}

impl LedgerTables {
    /// Open every table by name through `open`.
    ///
    /// # Errors
    ///
    /// Returns the first error `open` produces.
    pub fn open_with<F>(mut open: F) -> Result<Self, TableError>
    where
        F: FnMut(&'static str) -> Result<Arc<dyn Table>, TableError>,
    {
        Ok(Self {
            listings: open(LISTINGS_TABLE)?,
            sold_tickets: open(SOLD_TICKETS_TABLE)?,
            organizers: open(ORGANIZERS_TABLE)?,
            sequences: open(SEQUENCES_TABLE)?,
        })
    }
}

impl std::fmt::Debug for LedgerTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries([
                self.listings.name(),
                self.sold_tickets.name(),
                self.organizers.name(),
                self.sequences.name(),
            ])
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    struct PanickingClock;

    impl Clock for PanickingClock {
        #[allow(clippy::panic)]
        fn now(&self) -> DateTime<Utc> {
            panic!("clock read while formatting")
        }
    }

    #[test]
    fn debug_output_does_not_read_the_clock() {
        let env = TicketingEnvironment::new(Arc::new(PanickingClock), Arc::new(UuidGenerator));
        let rendered = format!("{env:?}");
        assert!(rendered.contains("TicketingEnvironment"));
    }
}
