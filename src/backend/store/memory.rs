/**
 * In-Memory Stores
 *
 * Process-local implementations of the store traits, used in tests and when
 * no database is configured. Each store owns its own map behind a
 * `tokio::sync::RwLock`; conditional writes happen under a single write lock.
 *
 * Records past their `expires_at` are invisible to reads immediately and are
 * physically removed by `reap_expired`.
 */

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::backend::error::BackendResult;
use crate::backend::store::clock::MonotonicClock;
use crate::backend::store::follow::{FollowRecord, FollowStore, Follower};
use crate::backend::store::notification::NotificationStore;
use crate::backend::store::subscription::{ConnectionRecord, Subscriber, SubscriptionRegistry};
use crate::shared::{Notification, ThreadId};

/// Follow records keyed by thread, then by `inserted_at`
#[derive(Debug, Default)]
pub struct MemoryFollowStore {
    partitions: RwLock<HashMap<ThreadId, BTreeMap<DateTime<Utc>, FollowRecord>>>,
    clock: MonotonicClock,
}

impl MemoryFollowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FollowStore for MemoryFollowStore {
    async fn exists(&self, thread: &ThreadId, user_id: &str) -> BackendResult<bool> {
        Ok(self.get(thread, user_id).await?.is_some())
    }

    async fn get(&self, thread: &ThreadId, user_id: &str) -> BackendResult<Option<FollowRecord>> {
        let now = Utc::now();
        let partitions = self.partitions.read().await;

        Ok(partitions.get(thread).and_then(|records| {
            records
                .values()
                .find(|r| r.user_id == user_id && !r.is_expired(now))
                .cloned()
        }))
    }

    async fn insert(&self, thread: &ThreadId, user_id: &str, ttl: Option<Duration>) -> BackendResult<()> {
        let now = Utc::now();
        let mut partitions = self.partitions.write().await;
        let records = partitions.entry(thread.clone()).or_default();

        // An expired record still waiting for the reaper must not block a new follow.
        records.retain(|_, r| !(r.user_id == user_id && r.is_expired(now)));

        if records.values().any(|r| r.user_id == user_id) {
            tracing::debug!("[Store] {} already follows {}", user_id, thread);
            return Ok(());
        }

        let inserted_at = self.clock.next();
        records.insert(
            inserted_at,
            FollowRecord {
                thread: thread.clone(),
                user_id: user_id.to_string(),
                inserted_at,
                expires_at: ttl.map(|ttl| now + ttl),
            },
        );
        tracing::debug!("[Store] {} now follows {}", user_id, thread);

        Ok(())
    }

    async fn remove(&self, thread: &ThreadId, user_id: &str) -> BackendResult<()> {
        let mut partitions = self.partitions.write().await;

        if let Some(records) = partitions.get_mut(thread) {
            records.retain(|_, r| r.user_id != user_id);
            if records.is_empty() {
                partitions.remove(thread);
            }
        }

        Ok(())
    }

    async fn list_followers(&self, thread: &ThreadId) -> BackendResult<Vec<Follower>> {
        let now = Utc::now();
        let partitions = self.partitions.read().await;

        Ok(partitions
            .get(thread)
            .map(|records| {
                records
                    .values()
                    .filter(|r| !r.is_expired(now))
                    .map(|r| Follower {
                        user_id: r.user_id.clone(),
                        inserted_at: r.inserted_at,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn set_expiry_for_all(&self, thread: &ThreadId, expires_at: DateTime<Utc>) -> BackendResult<()> {
        let now = Utc::now();
        let mut partitions = self.partitions.write().await;

        if let Some(records) = partitions.get_mut(thread) {
            for record in records.values_mut().filter(|r| !r.is_expired(now)) {
                record.expires_at = Some(expires_at);
            }
        }

        Ok(())
    }

    async fn clear_expiry_for_all(&self, thread: &ThreadId) -> BackendResult<Vec<String>> {
        let now = Utc::now();
        let mut partitions = self.partitions.write().await;

        let mut retained = Vec::new();
        if let Some(records) = partitions.get_mut(thread) {
            for record in records.values_mut().filter(|r| !r.is_expired(now)) {
                record.expires_at = None;
                retained.push(record.user_id.clone());
            }
        }

        Ok(retained)
    }

    async fn reap_expired(&self, now: DateTime<Utc>) -> BackendResult<usize> {
        let mut partitions = self.partitions.write().await;
        let mut reaped = 0;

        for records in partitions.values_mut() {
            let before = records.len();
            records.retain(|_, r| !r.is_expired(now));
            reaped += before - records.len();
        }
        partitions.retain(|_, records| !records.is_empty());

        Ok(reaped)
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    /// thread -> connection id -> user id
    subscriptions: HashMap<ThreadId, BTreeMap<String, String>>,
    connections: HashMap<String, ConnectionRecord>,
}

impl RegistryState {
    fn drop_subscription(&mut self, thread: &ThreadId, connection_id: &str) {
        if let Some(bindings) = self.subscriptions.get_mut(thread) {
            bindings.remove(connection_id);
            if bindings.is_empty() {
                self.subscriptions.remove(thread);
            }
        }
    }
}

/// Subscriptions and connection records sharing one lock
#[derive(Debug, Default)]
pub struct MemorySubscriptionRegistry {
    state: RwLock<RegistryState>,
}

impl MemorySubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionRegistry for MemorySubscriptionRegistry {
    async fn open_connection(&self, connection_id: &str) -> BackendResult<()> {
        let mut state = self.state.write().await;
        state
            .connections
            .entry(connection_id.to_string())
            .or_insert_with(|| ConnectionRecord {
                connection_id: connection_id.to_string(),
                connected_at: Utc::now(),
                subscription: None,
            });

        Ok(())
    }

    async fn subscribe(&self, thread: &ThreadId, connection_id: &str, user_id: &str) -> BackendResult<()> {
        let mut state = self.state.write().await;

        let previous = state
            .connections
            .entry(connection_id.to_string())
            .or_insert_with(|| ConnectionRecord {
                connection_id: connection_id.to_string(),
                connected_at: Utc::now(),
                subscription: None,
            })
            .subscription
            .replace(thread.clone());

        if let Some(previous) = previous.filter(|previous| previous != thread) {
            tracing::debug!("[Store] {} moves from {} to {}", connection_id, previous, thread);
            state.drop_subscription(&previous, connection_id);
        }

        state
            .subscriptions
            .entry(thread.clone())
            .or_default()
            .insert(connection_id.to_string(), user_id.to_string());

        Ok(())
    }

    async fn unsubscribe(&self, thread: &ThreadId, connection_id: &str) -> BackendResult<()> {
        let mut state = self.state.write().await;
        state.drop_subscription(thread, connection_id);

        if let Some(connection) = state.connections.get_mut(connection_id) {
            if connection.subscription.as_ref() == Some(thread) {
                connection.subscription = None;
            }
        }

        Ok(())
    }

    async fn list_subscribers(&self, thread: &ThreadId) -> BackendResult<Vec<Subscriber>> {
        let state = self.state.read().await;

        Ok(state
            .subscriptions
            .get(thread)
            .map(|bindings| {
                bindings
                    .iter()
                    .map(|(connection_id, user_id)| Subscriber {
                        connection_id: connection_id.clone(),
                        user_id: user_id.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn close_connection(&self, connection_id: &str) -> BackendResult<Option<ThreadId>> {
        let mut state = self.state.write().await;

        let thread = state
            .connections
            .remove(connection_id)
            .and_then(|connection| connection.subscription);
        if let Some(thread) = &thread {
            state.drop_subscription(thread, connection_id);
        }

        Ok(thread)
    }

    async fn connection(&self, connection_id: &str) -> BackendResult<Option<ConnectionRecord>> {
        Ok(self.state.read().await.connections.get(connection_id).cloned())
    }
}

/// Mailboxes keyed by user, then by `created_at`
#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    mailboxes: RwLock<HashMap<String, BTreeMap<DateTime<Utc>, Notification>>>,
    clock: MonotonicClock,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn record(
        &self,
        user_id: &str,
        notification_type: &str,
        payload: serde_json::Value,
        retention: Duration,
    ) -> BackendResult<Notification> {
        let created_at = self.clock.next();
        let notification = Notification {
            user_id: user_id.to_string(),
            created_at,
            notification_type: notification_type.to_string(),
            payload,
            read_time: None,
            expires_at: created_at + retention,
        };

        self.mailboxes
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .insert(created_at, notification.clone());

        Ok(notification)
    }

    async fn list(&self, user_id: &str, limit: usize) -> BackendResult<Vec<Notification>> {
        let now = Utc::now();
        let mailboxes = self.mailboxes.read().await;

        Ok(mailboxes
            .get(user_id)
            .map(|entries| {
                entries
                    .values()
                    .rev()
                    .filter(|n| n.expires_at > now)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn mark_read(&self, user_id: &str, created_at: DateTime<Utc>) -> BackendResult<bool> {
        let now = Utc::now();
        let mut mailboxes = self.mailboxes.write().await;

        match mailboxes
            .get_mut(user_id)
            .and_then(|entries| entries.get_mut(&created_at))
            .filter(|n| n.expires_at > now)
        {
            Some(notification) => {
                notification.read_time.get_or_insert(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn reap_expired(&self, now: DateTime<Utc>) -> BackendResult<usize> {
        let mut mailboxes = self.mailboxes.write().await;
        let mut reaped = 0;

        for entries in mailboxes.values_mut() {
            let before = entries.len();
            entries.retain(|_, n| n.expires_at > now);
            reaped += before - entries.len();
        }
        mailboxes.retain(|_, entries| !entries.is_empty());

        Ok(reaped)
    }
}
