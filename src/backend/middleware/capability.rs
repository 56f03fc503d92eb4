/**
 * Capability Extractors
 *
 * HTTP counterparts of the per-frame capability check on the live channel.
 *
 * - `CapabilityAuth` verifies `Authorization: Bearer <token>`.
 * - `ThreadScope` additionally reads `{participant_id}/{item_id}` from the
 *   path and rejects the request with 403 unless the capability was issued
 *   for that thread.
 */

use axum::extract::{FromRequestParts, Path};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::backend::auth::Capability;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::{RouteParams, ThreadId};

/// Verified bearer capability
#[derive(Debug, Clone)]
pub struct CapabilityAuth(pub Capability);

/// Capability that has been matched against the thread in the path
#[derive(Debug, Clone)]
pub struct ThreadScope {
    pub capability: Capability,
    pub thread: ThreadId,
}

fn bearer_token(parts: &Parts) -> Result<&str, BackendError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| BackendError::authentication("missing Authorization header"))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| BackendError::authentication("Authorization header is not a bearer token"))
}

impl FromRequestParts<AppState> for CapabilityAuth {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let capability = Capability::decode(token, state.verifier.as_ref()).inspect_err(|e| {
            tracing::debug!("[Auth] Rejected capability: {}", e);
        })?;
        Ok(Self(capability))
    }
}

impl FromRequestParts<AppState> for ThreadScope {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Path((participant_id, item_id)) = Path::<(String, String)>::from_request_parts(parts, state)
            .await
            .map_err(|e| BackendError::decoding(e.body_text()))?;

        let CapabilityAuth(capability) = CapabilityAuth::from_request_parts(parts, state).await?;
        capability.match_route(&RouteParams::new(participant_id.clone(), item_id.clone()))?;

        let thread = ThreadId::new(participant_id, item_id)?;
        Ok(Self { capability, thread })
    }
}
