//! Threadwatch - Thread Follow and Live Subscription Service
//!
//! Threadwatch keeps track of who should hear about activity on a thread, a
//! conversation anchored to one (participant, item) pair. Two independent
//! mechanisms are supported:
//!
//! - **Follows** - durable per-user registrations used for out-of-band
//!   notifications. Followers are retained while a thread is open and expire
//!   a fixed window after it closes.
//! - **Subscriptions** - live, connection-scoped registrations delivered over
//!   a WebSocket while the client stays connected.
//!
//! # Module Structure
//!
//! - **`shared`** - Wire and domain types (thread ids, capability claims,
//!   frames, event envelopes)
//! - **`backend`** - Server-side code (only compiled with the `ssr` feature)
//!   - Capability token verification
//!   - Follow, subscription and notification stores (memory and PostgreSQL)
//!   - Connection dispatcher and WebSocket endpoint
//!   - Event fan-out dispatcher and the status-change reactor
//!   - Axum router, configuration and startup
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - Enables the backend modules and the server binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use threadwatch::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::load()?;
//! let app = create_app(&config).await?;
//! # Ok(())
//! # }
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
