//! Capability token helpers
//!
//! Tokens are signed with HS256 under `TEST_SECRET`, the same way the
//! platform's token issuer signs them.

use jsonwebtoken::{encode, EncodingKey, Header};
use threadwatch::shared::CapabilityClaims;

pub const TEST_SECRET: &[u8] = b"threadwatch-test-secret";

/// Claims for `user_id` on thread (`participant_id`, `item_id`)
pub fn claims(participant_id: &str, item_id: &str, user_id: &str) -> CapabilityClaims {
    CapabilityClaims {
        participant_id: participant_id.to_string(),
        item_id: item_id.to_string(),
        user_id: user_id.to_string(),
        is_mine: participant_id == user_id,
        can_watch: true,
        can_write: true,
        exp: (chrono::Utc::now().timestamp() + 3600) as u64,
    }
}

pub fn sign(claims: &CapabilityClaims) -> String {
    encode(&Header::default(), claims, &EncodingKey::from_secret(TEST_SECRET))
        .expect("Failed to sign test token")
}

/// Signed watch-capable token
pub fn token_for(participant_id: &str, item_id: &str, user_id: &str) -> String {
    sign(&claims(participant_id, item_id, user_id))
}

/// Create authorization header value
pub fn auth_header(token: &str) -> String {
    format!("Bearer {}", token)
}
