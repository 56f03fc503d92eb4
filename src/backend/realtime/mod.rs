//! Real-time Connection Module
//!
//! Live WebSocket connections: lifecycle routing, action dispatch and
//! server-initiated pushes.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs        - Module exports
//! ├── dispatcher.rs - ConnectionDispatcher and ActionRoutes
//! ├── actions.rs    - forum.* actions and lifecycle handlers
//! ├── hub.rs        - Per-connection outbound queues
//! ├── delivery.rs   - Push to every subscriber of a thread
//! └── socket.rs     - GET /ws transport
//! ```
//!
//! # Frame Flow
//!
//! ```text
//! socket ──frame──▶ ConnectionDispatcher ──action──▶ ActionHandler
//!    ▲                                                   │
//!    └──────────── ConnectionHub ◀── DispatchResponse ───┘
//! ```

/// Lifecycle and action routing
pub mod dispatcher;

/// Thread watching actions
pub mod actions;

/// Outbound queues
pub mod hub;

/// Thread-scoped pushes
pub mod delivery;

/// WebSocket transport
pub mod socket;

pub use actions::{forum_routes, CloseConnection, ForumContext, OpenConnection};
pub use delivery::{PushReport, ThreadDelivery};
pub use dispatcher::{ActionHandler, ActionRoutes, ConnectionContext, ConnectionDispatcher, LifecycleHandler};
pub use hub::{ConnectionHub, LiveChannel, SendOutcome};
pub use socket::handle_socket_upgrade;
