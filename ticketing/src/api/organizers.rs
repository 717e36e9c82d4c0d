//! Organizer registry endpoints.
//!
//! - GET /api/organizers - Registered organizers
//! - POST /api/organizers - Add an organizer (caller identity required)
//! - DELETE /api/organizers/:sequence - Remove an organizer (caller identity required)
//! - GET /api/identities/:identity/authorized - Whether an identity has organizer rights

use super::error::ApiError;
use super::extract::{JsonBody, PathParam};
use super::identity::CallerIdentity;
use crate::server::state::AppState;
use crate::types::{Identity, Organizer, OrganizerSequence};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

/// Request to add an organizer.
#[derive(Debug, Deserialize)]
pub struct AddOrganizerRequest {
    /// Identity to grant organizer rights
    pub identity: String,
}

/// Confirmation of a registry change.
#[derive(Debug, Serialize, Deserialize)]
pub struct OrganizerResponse {
    /// Sequence number of the affected entry
    pub sequence: OrganizerSequence,
    /// Organizer identity
    pub identity: Identity,
    /// Confirmation message
    pub message: String,
}

/// Authorization status of an identity.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    /// Identity asked about
    pub identity: Identity,
    /// Whether it is the admin or a registered organizer
    pub authorized: bool,
}

/// List registered organizers.
///
/// # Errors
///
/// Returns 500 if storage fails.
pub async fn list_organizers(
    State(state): State<AppState>,
) -> Result<Json<Vec<Organizer>>, ApiError> {
    Ok(Json(state.service.list_organizers().await?))
}

/// Add an organizer.
///
/// # Errors
///
/// 401 if the caller lacks rights, 422 for an empty identity.
pub async fn add_organizer(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    JsonBody(request): JsonBody<AddOrganizerRequest>,
) -> Result<(StatusCode, Json<OrganizerResponse>), ApiError> {
    let organizer = state
        .service
        .add_organizer(&caller, Identity::new(request.identity))
        .await?;
    let message = format!(
        "Organizer {} added with sequence {}",
        organizer.identity, organizer.sequence
    );
    Ok((
        StatusCode::CREATED,
        Json(OrganizerResponse {
            sequence: organizer.sequence,
            identity: organizer.identity,
            message,
        }),
    ))
}

/// Remove an organizer.
///
/// # Errors
///
/// 401 if the caller lacks rights, 404 if the sequence is unknown.
pub async fn remove_organizer(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    PathParam(sequence): PathParam<u64>,
) -> Result<Json<OrganizerResponse>, ApiError> {
    let organizer = state
        .service
        .remove_organizer(&caller, OrganizerSequence::new(sequence))
        .await?;
    let message = format!(
        "Organizer {} with sequence {} removed",
        organizer.identity, organizer.sequence
    );
    Ok(Json(OrganizerResponse {
        sequence: organizer.sequence,
        identity: organizer.identity,
        message,
    }))
}

/// Check whether an identity holds organizer rights.
///
/// # Errors
///
/// Returns 500 if storage fails.
pub async fn get_authorization(
    State(state): State<AppState>,
    PathParam(identity): PathParam<String>,
) -> Result<Json<AuthorizationResponse>, ApiError> {
    let identity = Identity::new(identity);
    let authorized = state.service.is_authorized(&identity).await?;
    Ok(Json(AuthorizationResponse {
        identity,
        authorized,
    }))
}
