//! Backend Error Module
//!
//! This module defines the error taxonomy used across the backend.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - HTTP and live-channel reply conversions
//! ```
//!
//! # Reply Conversion
//!
//! `BackendError` implements `IntoResponse`, so HTTP handlers return it
//! directly. The connection dispatcher converts it into a `DispatchResponse`
//! instead, which keeps the live connection open.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::{BackendError, BackendResult};
