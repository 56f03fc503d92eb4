//! Shared Module
//!
//! Types that cross the wire or the process boundary: thread identity and
//! status, capability claims, live-channel frames, domain event envelopes and
//! notification records. Nothing here depends on the server stack, so
//! clients can decode the same frames the server produces.

/// Thread identity and status phases
pub mod thread;

/// Capability claim set and route parameters
pub mod capability;

/// Live channel frames
pub mod message;

/// Domain event envelopes and payloads
pub mod event;

/// Notification mailbox records
pub mod notification;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use capability::{CapabilityClaims, RouteParams};
pub use error::SharedError;
pub use event::{EventEnvelope, EventMetadata, MessagePosted, StatusChanged};
pub use message::{ActionMessage, DispatchResponse};
pub use notification::Notification;
pub use thread::{StatusPhase, ThreadId, ThreadStatus};
