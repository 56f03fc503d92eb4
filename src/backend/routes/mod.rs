//! Route Configuration Module
//!
//! Routes are grouped by concern; `router::create_router` assembles them.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs             - Module exports
//! ├── router.rs          - Router assembly, fallback and tracing
//! ├── realtime_routes.rs - /ws and /events
//! └── thread_routes.rs   - follows and notifications
//! ```

/// Router assembly
pub mod router;

/// Live channel and event intake
pub mod realtime_routes;

/// Follows and notifications
pub mod thread_routes;

pub use router::create_router;
