//! Listing endpoints.
//!
//! - GET /api/listings - All listings
//! - POST /api/listings - Create a listing (caller identity required)
//! - GET /api/listings/:id - Listing details
//! - DELETE /api/listings/:id - Delete a listing (caller identity required)
//! - GET /api/listings/:id/availability - Whether a unit can still be sold
//! - POST /api/listings/:id/reservation - Reserve for a username
//! - DELETE /api/listings/:id/reservation?username= - Release a reservation
//! - POST /api/listings/:id/purchase - Buy one ticket (caller identity required)

use super::error::ApiError;
use super::extract::{JsonBody, PathParam, QueryParams};
use super::identity::CallerIdentity;
use crate::server::state::AppState;
use crate::types::{EventTicketListing, ListingId, ListingPayload, SoldTicketRecord};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create a listing.
#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    /// Listing title
    pub title: String,
    /// Listing description
    pub description: String,
    /// Price of one ticket
    pub unit_price: f64,
    /// Maximum sellable units (omit for unbounded)
    #[serde(default)]
    pub capacity: Option<u32>,
}

impl From<CreateListingRequest> for ListingPayload {
    fn from(request: CreateListingRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            unit_price: request.unit_price,
            capacity: request.capacity,
        }
    }
}

/// Availability of a listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    /// Listing ID
    pub listing_id: ListingId,
    /// Whether another unit can be sold
    pub available: bool,
}

/// Request naming the username acting on a listing.
#[derive(Debug, Deserialize)]
pub struct UsernameRequest {
    /// Display username
    pub username: String,
}

/// Reservation state after a reserve or release.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReservationResponse {
    /// Listing ID
    pub listing_id: ListingId,
    /// Username the request acted for
    pub username: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// List all listings.
///
/// # Errors
///
/// Returns 500 if storage fails.
pub async fn list_listings(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventTicketListing>>, ApiError> {
    Ok(Json(state.service.list_listings().await?))
}

/// Create a listing.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/listings \
///   -H "X-Caller-Identity: organizer-1" \
///   -H "Content-Type: application/json" \
///   -d '{"title":"Concert","description":"Open air","unit_price":50.0,"capacity":100}'
/// ```
///
/// # Errors
///
/// 401 without identity or rights, 422 for a bad price.
pub async fn create_listing(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    JsonBody(request): JsonBody<CreateListingRequest>,
) -> Result<(StatusCode, Json<EventTicketListing>), ApiError> {
    let listing = state
        .service
        .create_listing(&caller, request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// Get a listing.
///
/// # Errors
///
/// 404 if absent.
pub async fn get_listing(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> Result<Json<EventTicketListing>, ApiError> {
    Ok(Json(state.service.get_listing(&ListingId::new(id)).await?))
}

/// Delete a listing.
///
/// # Errors
///
/// 404 if absent, 401 if the caller may not delete it.
pub async fn delete_listing(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    PathParam(id): PathParam<String>,
) -> Result<Json<EventTicketListing>, ApiError> {
    let listing = state
        .service
        .delete_listing(&caller, &ListingId::new(id))
        .await?;
    Ok(Json(listing))
}

/// Check whether a listing can still be bought.
///
/// # Errors
///
/// 404 if absent.
pub async fn get_availability(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let listing_id = ListingId::new(id);
    let available = state.service.check_availability(&listing_id).await?;
    Ok(Json(AvailabilityResponse {
        listing_id,
        available,
    }))
}

/// Reserve a listing.
///
/// # Errors
///
/// 404 if absent, 409 if reserved by another username.
pub async fn reserve_listing(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
    JsonBody(request): JsonBody<UsernameRequest>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let listing_id = state
        .service
        .reserve_ticket(&ListingId::new(id), &request.username)
        .await?;
    Ok(Json(ReservationResponse {
        listing_id,
        username: request.username,
    }))
}

/// Release a reservation.
///
/// # Errors
///
/// 404 if absent, 409 if reserved by another username.
pub async fn release_reservation(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
    QueryParams(request): QueryParams<UsernameRequest>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let listing_id = state
        .service
        .release_reservation(&ListingId::new(id), &request.username)
        .await?;
    Ok(Json(ReservationResponse {
        listing_id,
        username: request.username,
    }))
}

/// Purchase one ticket.
///
/// # Errors
///
/// 403 for organizers under role-gated profiles, 404 if absent, 409 if sold
/// out or reserved by someone else while reservations are enforced.
pub async fn purchase_ticket(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    PathParam(id): PathParam<String>,
    JsonBody(request): JsonBody<UsernameRequest>,
) -> Result<(StatusCode, Json<SoldTicketRecord>), ApiError> {
    let record = state
        .service
        .purchase_ticket(&caller, &ListingId::new(id), &request.username)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}
