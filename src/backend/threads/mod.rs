//! Thread HTTP Module
//!
//! Request handlers for follows and the notification mailbox. Route wiring
//! lives in `routes::thread_routes`.
//!
//! # Module Structure
//!
//! ```text
//! threads/
//! ├── mod.rs           - Module exports
//! ├── handlers.rs      - follow, unfollow, followers
//! └── notifications.rs - mailbox listing and read marks
//! ```

pub mod handlers;
pub mod notifications;

pub use handlers::{follow_thread, list_followers, unfollow_thread, FollowersResponse};
pub use notifications::{list_notifications, mark_notification_read, NotificationQuery};
