/**
 * Thread Capabilities
 *
 * A `Capability` is the verified, typed form of a capability token. It is
 * attached to one request or one inbound frame for the duration of a single
 * dispatch and is never persisted.
 *
 * # Scope Enforcement
 *
 * `match_route` compares the thread coordinates a caller targets against the
 * thread the capability was issued for. Without it a token issued for one
 * thread could be replayed against another thread's endpoint.
 */

use crate::backend::auth::verifier::TokenVerifier;
use crate::backend::error::{BackendError, BackendResult};
use crate::shared::{CapabilityClaims, RouteParams, ThreadId};

/// Verified rights on exactly one thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    thread: ThreadId,
    claims: CapabilityClaims,
}

impl Capability {
    /// Verify and decode a raw token
    ///
    /// # Errors
    ///
    /// * `AuthenticationError` - token missing, malformed, badly signed,
    ///   expired, or its claims do not name a thread and a user
    pub fn decode(raw_token: &str, verifier: &dyn TokenVerifier) -> BackendResult<Self> {
        let raw_token = raw_token.trim();
        if raw_token.is_empty() {
            return Err(BackendError::authentication("missing capability token"));
        }

        let claims = verifier.verify(raw_token)?;
        Self::from_claims(claims)
    }

    /// Build a capability from claims that have already been verified
    pub fn from_claims(claims: CapabilityClaims) -> BackendResult<Self> {
        let thread = ThreadId::new(claims.participant_id.clone(), claims.item_id.clone())
            .map_err(|e| BackendError::authentication(format!("capability claims are malformed: {}", e)))?;

        if claims.user_id.trim().is_empty() {
            return Err(BackendError::authentication(
                "capability claims are malformed: userId must not be empty",
            ));
        }

        Ok(Self { thread, claims })
    }

    /// Check that the targeted thread is the one this capability covers
    ///
    /// Only the coordinates present in `params` are compared.
    ///
    /// # Errors
    ///
    /// * `ForbiddenError` - a supplied `itemId` or `participantId` differs
    pub fn match_route(&self, params: &RouteParams) -> BackendResult<()> {
        if let Some(item_id) = &params.item_id {
            if item_id != &self.thread.item_id {
                return Err(BackendError::forbidden(format!(
                    "capability is not valid for item '{}'",
                    item_id
                )));
            }
        }

        if let Some(participant_id) = &params.participant_id {
            if participant_id != &self.thread.participant_id {
                return Err(BackendError::forbidden(format!(
                    "capability is not valid for participant '{}'",
                    participant_id
                )));
            }
        }

        Ok(())
    }

    /// Fail with `ForbiddenError` unless the capability grants watch rights
    pub fn require_watch(&self) -> BackendResult<()> {
        if self.claims.can_watch {
            Ok(())
        } else {
            Err(BackendError::forbidden("capability does not allow watching this thread"))
        }
    }

    pub fn thread(&self) -> &ThreadId {
        &self.thread
    }

    pub fn user_id(&self) -> &str {
        &self.claims.user_id
    }

    pub fn is_mine(&self) -> bool {
        self.claims.is_mine
    }

    pub fn can_watch(&self) -> bool {
        self.claims.can_watch
    }

    pub fn can_write(&self) -> bool {
        self.claims.can_write
    }

    pub fn claims(&self) -> &CapabilityClaims {
        &self.claims
    }
}
