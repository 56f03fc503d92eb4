//! Backend Module
//!
//! Server-side code for Threadwatch: capability checks, the follow and
//! subscription stores, the live-connection dispatcher and the domain event
//! fan-out.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs      - Module exports and documentation
//! ├── server/     - Configuration, state and startup
//! ├── routes/     - Route configuration
//! ├── auth/       - Capability token verification and scope checks
//! ├── store/      - Follow store, subscription registry, notification mailbox
//! ├── realtime/   - WebSocket transport and connection dispatcher
//! ├── events/     - Event fan-out, status reactor, message notifier
//! ├── threads/    - Follow and mailbox HTTP handlers
//! ├── middleware/ - Capability extractors
//! └── error/      - Error types
//! ```
//!
//! # Data Flow
//!
//! ```text
//! WebSocket frame ─▶ ConnectionDispatcher ─▶ Capability ─▶ SubscriptionRegistry / FollowStore
//! POST /events    ─▶ EventDispatcher ─┬─▶ StatusChangeReactor ─▶ FollowStore
//!                                     └─▶ MessagePostedNotifier ─▶ NotificationStore, ConnectionHub
//! ```

/// Server initialization, state and configuration
pub mod server;

/// HTTP route configuration
pub mod routes;

/// Capability tokens
pub mod auth;

/// Storage traits and implementations
pub mod store;

/// Live connections
pub mod realtime;

/// Domain events
pub mod events;

/// Thread HTTP handlers
pub mod threads;

/// Request extractors
pub mod middleware;

/// Backend-specific error types
pub mod error;

pub use error::{BackendError, BackendResult};
pub use server::{create_app, AppState, ServerConfig};
