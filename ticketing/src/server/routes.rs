//! Router configuration.

use super::health::health_check;
use super::state::AppState;
use crate::api::{listings, organizers, tickets};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build the complete router.
///
/// Health check at `/health`, everything else nested under `/api`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Listings
        .route(
            "/listings",
            get(listings::list_listings).post(listings::create_listing),
        )
        .route(
            "/listings/:id",
            get(listings::get_listing).delete(listings::delete_listing),
        )
        .route(
            "/listings/:id/availability",
            get(listings::get_availability),
        )
        .route(
            "/listings/:id/reservation",
            post(listings::reserve_listing).delete(listings::release_reservation),
        )
        .route("/listings/:id/purchase", post(listings::purchase_ticket))
        // Sold tickets
        .route("/tickets", get(tickets::list_tickets))
        .route("/tickets/:id", get(tickets::get_ticket))
        .route("/tickets/:id/resell", post(tickets::resell_ticket))
        .route("/tickets/:id/transfer", post(tickets::transfer_ticket))
        .route("/tickets/:id/refund", post(tickets::refund_ticket))
        // Organizers
        .route(
            "/organizers",
            get(organizers::list_organizers).post(organizers::add_organizer),
        )
        .route(
            "/organizers/:sequence",
            axum::routing::delete(organizers::remove_organizer),
        )
        .route(
            "/identities/:identity/authorized",
            get(organizers::get_authorization),
        );

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
