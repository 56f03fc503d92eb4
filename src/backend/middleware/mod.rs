//! Middleware Module
//!
//! Request extractors that run before HTTP handlers.
//!
//! # Module Structure
//!
//! ```text
//! middleware/
//! ├── mod.rs        - Module exports
//! └── capability.rs - Bearer capability and thread scope extractors
//! ```

pub mod capability;

pub use capability::{CapabilityAuth, ThreadScope};
