/**
 * Capability Token Verification
 *
 * Capability tokens are JWTs issued by another service. This module only
 * verifies them: signature, algorithm and expiry are checked by
 * `jsonwebtoken`, and the claim set is decoded into `CapabilityClaims`.
 *
 * # Keys
 *
 * - HS256 with a shared secret (`CAPABILITY_SECRET`)
 * - RS256 with the issuer's PEM public key (`CAPABILITY_PUBLIC_KEY`)
 */

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::backend::error::{BackendError, BackendResult};
use crate::shared::CapabilityClaims;

/// Verifies a raw token and returns its claims
///
/// Implementations fail with `AuthenticationError` when the token is
/// malformed, its signature does not verify, or it has expired.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, raw_token: &str) -> BackendResult<CapabilityClaims>;
}

/// `TokenVerifier` backed by `jsonwebtoken`
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Verifier for HS256 tokens signed with a shared secret
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
            validation: Self::validation(Algorithm::HS256),
        }
    }

    /// Verifier for RS256 tokens, given the issuer's PEM-encoded public key
    pub fn from_rsa_pem(pem: &[u8]) -> BackendResult<Self> {
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|e| BackendError::not_configured(format!("invalid capability public key: {}", e)))?;

        Ok(Self {
            key,
            validation: Self::validation(Algorithm::RS256),
        })
    }

    fn validation(algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        // Expiry is enforced exactly as issued.
        validation.leeway = 0;
        validation.validate_aud = false;
        validation
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, raw_token: &str) -> BackendResult<CapabilityClaims> {
        decode::<CapabilityClaims>(raw_token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let message = match e.kind() {
                    ErrorKind::ExpiredSignature => "capability token has expired".to_string(),
                    ErrorKind::InvalidSignature => "capability token signature is invalid".to_string(),
                    _ => format!("capability token is invalid: {}", e),
                };
                tracing::debug!("[Auth] {}", message);
                BackendError::authentication(message)
            })
    }
}
