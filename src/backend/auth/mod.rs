//! Authentication Module
//!
//! Capability tokens scope a request or a live connection to exactly one
//! thread.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs        - Module exports
//! ├── verifier.rs   - JWT signature and expiry verification
//! └── capability.rs - Typed capability and route matching
//! ```

/// Token verification
pub mod verifier;

/// Thread capabilities
pub mod capability;

pub use capability::Capability;
pub use verifier::{JwtVerifier, TokenVerifier};
