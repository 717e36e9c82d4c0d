//! Caller identity extractor.
//!
//! Identity derivation happens upstream (gateway, mTLS terminator, ...); the
//! ledger only reads the result from the `X-Caller-Identity` header.

use super::error::ApiError;
use crate::types::Identity;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Header carrying the caller identity
pub const CALLER_IDENTITY_HEADER: &str = "X-Caller-Identity";

/// Identity of the caller, required by mutating operations.
///
/// Rejects with 401 when the header is missing, empty or not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CALLER_IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Self(Identity::new(value)))
            .ok_or_else(|| {
                ApiError::unauthorized(format!("missing {CALLER_IDENTITY_HEADER} header"))
            })
    }
}
