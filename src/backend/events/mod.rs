//! Domain Event Module
//!
//! Envelopes published by the rest of the platform are fanned out to every
//! handler registered for their type.
//!
//! # Module Structure
//!
//! ```text
//! events/
//! ├── mod.rs        - Module exports and the default routing table
//! ├── dispatcher.rs - EventDispatcher, EventRoutes, FanOutReport
//! ├── reactor.rs    - thread.status_changed: follower retention
//! ├── notify.rs     - thread.message_posted: mailbox entries and pushes
//! └── intake.rs     - POST /events
//! ```

/// Fan-out dispatch
pub mod dispatcher;

/// Status transitions
pub mod reactor;

/// Message notifications
pub mod notify;

/// HTTP delivery endpoint
pub mod intake;

pub use dispatcher::{EventDispatcher, EventHandler, EventRoutes, FanOutReport, HandlerFailure};
pub use notify::MessagePostedNotifier;
pub use reactor::{StatusChangeReactor, Transition};

use crate::shared::event::{MESSAGE_POSTED, STATUS_CHANGED};

/// The thread event table
pub fn thread_event_routes(reactor: StatusChangeReactor, notifier: MessagePostedNotifier) -> EventRoutes {
    EventRoutes::new()
        .on(STATUS_CHANGED, reactor)
        .on(MESSAGE_POSTED, notifier)
}
