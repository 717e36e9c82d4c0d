//! Application state for the HTTP server.

use crate::service::TicketService;
use std::sync::Arc;

/// State shared by all handlers; cloned (cheaply, via `Arc`) per request.
#[derive(Clone, Debug)]
pub struct AppState {
    /// The ledger
    pub service: Arc<TicketService>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(service: Arc<TicketService>) -> Self {
        Self { service }
    }
}
