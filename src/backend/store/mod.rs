//! Storage Module
//!
//! Each record family is owned by exactly one store trait; nothing else
//! mutates those records directly.
//!
//! # Module Structure
//!
//! ```text
//! store/
//! ├── mod.rs          - Module exports, store bundle and the expiry reaper
//! ├── follow.rs       - FollowStore trait and follow records
//! ├── subscription.rs - SubscriptionRegistry trait, subscriber and connection records
//! ├── notification.rs - NotificationStore trait
//! ├── clock.rs        - Strictly increasing ordering timestamps
//! ├── memory.rs       - In-memory implementations
//! └── postgres.rs     - PostgreSQL implementations (sqlx)
//! ```
//!
//! # Expiry
//!
//! Follow and notification records carry an optional absolute `expires_at`.
//! Reads treat an elapsed record as absent; `spawn_reaper` deletes them on an
//! interval.

/// Follow registrations
pub mod follow;

/// Live subscriptions and connection records
pub mod subscription;

/// Notification mailbox
pub mod notification;

/// Ordering timestamps
pub mod clock;

/// In-memory stores
pub mod memory;

/// PostgreSQL stores
pub mod postgres;

pub use follow::{FollowRecord, FollowStore, Follower};
pub use memory::{MemoryFollowStore, MemoryNotificationStore, MemorySubscriptionRegistry};
pub use notification::NotificationStore;
pub use postgres::PgStores;
pub use subscription::{ConnectionRecord, Subscriber, SubscriptionRegistry};

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::backend::error::BackendResult;

/// The three stores behind their traits
#[derive(Clone)]
pub struct Stores {
    pub follows: Arc<dyn FollowStore>,
    pub subscriptions: Arc<dyn SubscriptionRegistry>,
    pub notifications: Arc<dyn NotificationStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            follows: Arc::new(MemoryFollowStore::new()),
            subscriptions: Arc::new(MemorySubscriptionRegistry::new()),
            notifications: Arc::new(MemoryNotificationStore::new()),
        }
    }

    /// Connect to PostgreSQL and run migrations
    pub async fn connect(database_url: &str, timeout: Duration) -> BackendResult<Self> {
        Ok(PgStores::connect(database_url, timeout).await?.into())
    }
}

impl From<PgStores> for Stores {
    fn from(stores: PgStores) -> Self {
        Self {
            follows: Arc::new(stores.follows),
            subscriptions: Arc::new(stores.subscriptions),
            notifications: Arc::new(stores.notifications),
        }
    }
}

/// Periodically delete expired follow and notification records
pub fn spawn_reaper(
    follows: Arc<dyn FollowStore>,
    notifications: Arc<dyn NotificationStore>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let now = Utc::now();

            match follows.reap_expired(now).await {
                Ok(0) => {}
                Ok(count) => tracing::info!("[Store] Reaped {} expired follow records", count),
                Err(e) => tracing::error!("[Store] Failed to reap follow records: {}", e),
            }
            match notifications.reap_expired(now).await {
                Ok(0) => {}
                Ok(count) => tracing::info!("[Store] Reaped {} expired notifications", count),
                Err(e) => tracing::error!("[Store] Failed to reap notifications: {}", e),
            }
        }
    })
}
