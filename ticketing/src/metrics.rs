//! Business metrics for the ticket ledger.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `ledger_listings_created_total` - Listings created
//! - `ledger_listings_deleted_total` - Listings deleted
//! - `ledger_tickets_sold_total` - Successful purchases
//! - `ledger_tickets_refunded_total{inventory}` - Refunds, by whether inventory was restored
//! - `ledger_tickets_resold_total{kind}` - Resales and transfers
//! - `ledger_reservations_total{status}` - Reservations placed and released
//! - `ledger_organizers_total{status}` - Organizers added and removed
//! - `ledger_operation_failures_total{operation,kind}` - Failed operations by error kind
//!
//! The Postgres table adds `ledger_storage_query_duration_seconds` and
//! `ledger_storage_errors_total`.

use crate::error::ErrorKind;
use metrics::describe_counter;

/// Register descriptions for all ledger metrics.
///
/// Call once at startup, after the recorder is installed.
pub fn register_ledger_metrics() {
    describe_counter!(
        "ledger_listings_created_total",
        "Total number of event-ticket listings created"
    );
    describe_counter!(
        "ledger_listings_deleted_total",
        "Total number of event-ticket listings deleted"
    );
    describe_counter!(
        "ledger_tickets_sold_total",
        "Total number of tickets purchased"
    );
    describe_counter!(
        "ledger_tickets_refunded_total",
        "Total number of tickets refunded, by whether inventory was restored"
    );
    describe_counter!(
        "ledger_tickets_resold_total",
        "Total number of ticket resales and transfers"
    );
    describe_counter!(
        "ledger_reservations_total",
        "Total number of reservations by status (placed, released)"
    );
    describe_counter!(
        "ledger_organizers_total",
        "Total number of organizer registry changes by status (added, removed)"
    );
    describe_counter!(
        "ledger_operation_failures_total",
        "Total number of failed ledger operations by operation and error kind"
    );

    tracing::info!("Ledger metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record a listing creation.
pub fn record_listing_created() {
    metrics::counter!("ledger_listings_created_total").increment(1);
}

/// Record a listing deletion.
pub fn record_listing_deleted() {
    metrics::counter!("ledger_listings_deleted_total").increment(1);
}

/// Record a completed purchase.
pub fn record_ticket_sold() {
    metrics::counter!("ledger_tickets_sold_total").increment(1);
}

/// Record a refund.
///
/// # Arguments
///
/// * `inventory_restored` - Whether the listing's sold count was decremented
pub fn record_ticket_refunded(inventory_restored: bool) {
    let inventory = if inventory_restored { "restored" } else { "kept" };
    metrics::counter!("ledger_tickets_refunded_total", "inventory" => inventory).increment(1);
}

/// Record a resale (`kind = "resell"`) or transfer (`kind = "transfer"`).
pub fn record_ticket_resold(kind: &'static str) {
    metrics::counter!("ledger_tickets_resold_total", "kind" => kind).increment(1);
}

/// Record a reservation status change (`placed` or `released`).
pub fn record_reservation(status: &'static str) {
    metrics::counter!("ledger_reservations_total", "status" => status).increment(1);
}

/// Record an organizer registry change (`added` or `removed`).
pub fn record_organizer(status: &'static str) {
    metrics::counter!("ledger_organizers_total", "status" => status).increment(1);
}

/// Record a failed operation.
///
/// # Arguments
///
/// * `operation` - Operation name, e.g. `purchase_ticket`
/// * `kind` - Error kind the caller received
pub fn record_operation_failure(operation: &'static str, kind: ErrorKind) {
    metrics::counter!(
        "ledger_operation_failures_total",
        "operation" => operation,
        "kind" => kind.as_str()
    )
    .increment(1);
    tracing::debug!(operation, kind = kind.as_str(), "Recorded operation failure metric");
}
