//! Common test utilities and helpers
//!
//! - Capability token minting
//! - In-memory application fixtures
//! - Response assertions
//! - PostgreSQL fixtures

#[cfg(feature = "ssr")]
pub mod assertions;
#[cfg(feature = "ssr")]
pub mod auth_helpers;
#[cfg(feature = "ssr")]
pub mod database;
#[cfg(feature = "ssr")]
pub mod fixtures;

#[cfg(feature = "ssr")]
pub use assertions::*;
#[cfg(feature = "ssr")]
pub use auth_helpers::*;
#[cfg(feature = "ssr")]
pub use fixtures::*;
