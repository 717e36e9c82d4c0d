//! Sold-ticket endpoints.
//!
//! - GET /api/tickets - All sold-ticket records
//! - GET /api/tickets/:id - Record details
//! - POST /api/tickets/:id/resell - Resell (caller identity required)
//! - POST /api/tickets/:id/transfer - Hand to another username
//! - POST /api/tickets/:id/refund - Refund and remove the record

use super::error::ApiError;
use super::extract::{JsonBody, PathParam};
use super::identity::CallerIdentity;
use super::listings::UsernameRequest;
use crate::server::state::AppState;
use crate::types::{Identity, SoldTicketId, SoldTicketRecord};
use axum::{
    Json,
    extract::State,
};
use serde::{Deserialize, Serialize};

/// Request to resell a ticket.
#[derive(Debug, Deserialize)]
pub struct ResellRequest {
    /// New holder's display name
    pub username: String,
    /// New owner identity; the current owner is kept when omitted
    #[serde(default)]
    pub new_owner: Option<String>,
}

/// Acknowledgement carrying the affected ticket ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct TicketAck {
    /// Sold-ticket ID
    pub ticket_id: SoldTicketId,
}

/// List all sold-ticket records.
///
/// # Errors
///
/// Returns 500 if storage fails.
pub async fn list_tickets(
    State(state): State<AppState>,
) -> Result<Json<Vec<SoldTicketRecord>>, ApiError> {
    Ok(Json(state.service.list_sold_records().await?))
}

/// Get a sold-ticket record.
///
/// # Errors
///
/// 404 if absent.
pub async fn get_ticket(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> Result<Json<SoldTicketRecord>, ApiError> {
    Ok(Json(
        state.service.get_sold_record(&SoldTicketId::new(id)).await?,
    ))
}

/// Resell a ticket.
///
/// # Errors
///
/// 404 if absent, 401 if the caller is not the owner under ownership-gated profiles.
pub async fn resell_ticket(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    PathParam(id): PathParam<String>,
    JsonBody(request): JsonBody<ResellRequest>,
) -> Result<Json<SoldTicketRecord>, ApiError> {
    let record = state
        .service
        .resell_ticket(
            &caller,
            &SoldTicketId::new(id),
            &request.username,
            request.new_owner.map(Identity::new),
        )
        .await?;
    Ok(Json(record))
}

/// Transfer a ticket to another username.
///
/// # Errors
///
/// 404 if absent.
pub async fn transfer_ticket(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
    JsonBody(request): JsonBody<UsernameRequest>,
) -> Result<Json<TicketAck>, ApiError> {
    let ticket_id = state
        .service
        .transfer_ticket(&SoldTicketId::new(id), &request.username)
        .await?;
    Ok(Json(TicketAck { ticket_id }))
}

/// Refund a ticket.
///
/// # Errors
///
/// 404 if absent.
pub async fn refund_ticket(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> Result<Json<TicketAck>, ApiError> {
    let ticket_id = state
        .service
        .refund_ticket(&SoldTicketId::new(id))
        .await?;
    Ok(Json(TicketAck { ticket_id }))
}
