/**
 * PostgreSQL Stores
 *
 * `sqlx` implementations of the store traits. Schema lives in `migrations/`
 * and is applied at connect time.
 *
 * # Timeouts
 *
 * Every operation is wrapped in `tokio::time::timeout`; an operation that
 * overruns `storage_timeout_ms` fails with `StorageError` rather than
 * blocking the dispatcher.
 *
 * # Expiry
 *
 * PostgreSQL has no native TTL. Reads filter out rows whose `expires_at` has
 * passed and `reap_expired` deletes them, driven by the server's reaper task.
 */

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use std::future::Future;
use std::sync::Arc;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::store::clock::MonotonicClock;
use crate::backend::store::follow::{FollowRecord, FollowStore, Follower};
use crate::backend::store::notification::NotificationStore;
use crate::backend::store::subscription::{ConnectionRecord, Subscriber, SubscriptionRegistry};
use crate::shared::{Notification, ThreadId};

/// Pool plus the per-operation time budget
#[derive(Clone)]
struct PgHandle {
    pool: PgPool,
    timeout: std::time::Duration,
}

impl PgHandle {
    async fn bounded<T, F>(&self, operation: F) -> BackendResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        Ok(tokio::time::timeout(self.timeout, operation).await??)
    }
}

/// All three stores sharing one connection pool
pub struct PgStores {
    pub follows: PgFollowStore,
    pub subscriptions: PgSubscriptionRegistry,
    pub notifications: PgNotificationStore,
}

impl PgStores {
    /// Connect, run migrations and build the stores
    pub async fn connect(database_url: &str, timeout: std::time::Duration) -> BackendResult<Self> {
        tracing::info!("[Store] Connecting to database...");
        let pool = tokio::time::timeout(
            timeout,
            PgPoolOptions::new()
                .acquire_timeout(timeout)
                .connect(database_url),
        )
        .await??;

        tracing::info!("[Store] Running database migrations...");
        sqlx::migrate!().run(&pool).await?;
        tracing::info!("[Store] Database ready");

        Ok(Self::from_pool(pool, timeout))
    }

    pub fn from_pool(pool: PgPool, timeout: std::time::Duration) -> Self {
        let handle = PgHandle { pool, timeout };
        Self {
            follows: PgFollowStore {
                db: handle.clone(),
                clock: Arc::new(MonotonicClock::new()),
            },
            subscriptions: PgSubscriptionRegistry { db: handle.clone() },
            notifications: PgNotificationStore {
                db: handle,
                clock: Arc::new(MonotonicClock::new()),
            },
        }
    }
}

fn thread_from_columns(participant_id: Option<String>, item_id: Option<String>) -> Option<ThreadId> {
    match (participant_id, item_id) {
        (Some(participant_id), Some(item_id)) => Some(ThreadId {
            participant_id,
            item_id,
        }),
        _ => None,
    }
}

pub struct PgFollowStore {
    db: PgHandle,
    clock: Arc<MonotonicClock>,
}

#[async_trait]
impl FollowStore for PgFollowStore {
    async fn exists(&self, thread: &ThreadId, user_id: &str) -> BackendResult<bool> {
        Ok(self.get(thread, user_id).await?.is_some())
    }

    async fn get(&self, thread: &ThreadId, user_id: &str) -> BackendResult<Option<FollowRecord>> {
        let row = self
            .db
            .bounded(
                sqlx::query(
                    r#"
                    SELECT user_id, inserted_at, expires_at
                    FROM thread_followers
                    WHERE partition_key = $1 AND user_id = $2
                      AND (expires_at IS NULL OR expires_at > $3)
                    "#,
                )
                .bind(thread.partition_key())
                .bind(user_id)
                .bind(Utc::now())
                .fetch_optional(&self.db.pool),
            )
            .await?;

        let record = row
            .map(|row| {
                Ok::<_, sqlx::Error>(FollowRecord {
                    thread: thread.clone(),
                    user_id: row.try_get("user_id")?,
                    inserted_at: row.try_get("inserted_at")?,
                    expires_at: row.try_get("expires_at")?,
                })
            })
            .transpose()?;

        Ok(record)
    }

    async fn insert(&self, thread: &ThreadId, user_id: &str, ttl: Option<Duration>) -> BackendResult<()> {
        let now = Utc::now();
        let key = thread.partition_key();
        let inserted_at = self.clock.next();
        let expires_at = ttl.map(|ttl| now + ttl);

        let result = self
            .db
            .bounded(async {
                // An expired row still waiting for the reaper must not block a new follow.
                sqlx::query(
                    r#"
                    DELETE FROM thread_followers
                    WHERE partition_key = $1 AND user_id = $2
                      AND expires_at IS NOT NULL AND expires_at <= $3
                    "#,
                )
                .bind(&key)
                .bind(user_id)
                .bind(now)
                .execute(&self.db.pool)
                .await?;

                sqlx::query(
                    r#"
                    INSERT INTO thread_followers
                        (partition_key, participant_id, item_id, user_id, inserted_at, expires_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (partition_key, user_id) DO NOTHING
                    "#,
                )
                .bind(&key)
                .bind(&thread.participant_id)
                .bind(&thread.item_id)
                .bind(user_id)
                .bind(inserted_at)
                .bind(expires_at)
                .execute(&self.db.pool)
                .await
            })
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!("[Store] {} already follows {}", user_id, thread);
        }

        Ok(())
    }

    async fn remove(&self, thread: &ThreadId, user_id: &str) -> BackendResult<()> {
        self.db
            .bounded(
                sqlx::query("DELETE FROM thread_followers WHERE partition_key = $1 AND user_id = $2")
                    .bind(thread.partition_key())
                    .bind(user_id)
                    .execute(&self.db.pool),
            )
            .await?;

        Ok(())
    }

    async fn list_followers(&self, thread: &ThreadId) -> BackendResult<Vec<Follower>> {
        let rows = self
            .db
            .bounded(
                sqlx::query(
                    r#"
                    SELECT user_id, inserted_at
                    FROM thread_followers
                    WHERE partition_key = $1
                      AND (expires_at IS NULL OR expires_at > $2)
                    ORDER BY inserted_at
                    "#,
                )
                .bind(thread.partition_key())
                .bind(Utc::now())
                .fetch_all(&self.db.pool),
            )
            .await?;

        let followers = rows
            .iter()
            .map(|row| {
                Ok(Follower {
                    user_id: row.try_get("user_id")?,
                    inserted_at: row.try_get("inserted_at")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(followers)
    }

    async fn set_expiry_for_all(&self, thread: &ThreadId, expires_at: DateTime<Utc>) -> BackendResult<()> {
        let user_ids: Vec<String> = self
            .list_followers(thread)
            .await?
            .into_iter()
            .map(|f| f.user_id)
            .collect();
        if user_ids.is_empty() {
            return Ok(());
        }

        self.db
            .bounded(
                sqlx::query(
                    r#"
                    UPDATE thread_followers
                    SET expires_at = $2
                    WHERE partition_key = $1 AND user_id = ANY($3)
                    "#,
                )
                .bind(thread.partition_key())
                .bind(expires_at)
                .bind(&user_ids)
                .execute(&self.db.pool),
            )
            .await?;

        Ok(())
    }

    async fn clear_expiry_for_all(&self, thread: &ThreadId) -> BackendResult<Vec<String>> {
        let rows = self
            .db
            .bounded(
                sqlx::query(
                    r#"
                    UPDATE thread_followers
                    SET expires_at = NULL
                    WHERE partition_key = $1
                      AND (expires_at IS NULL OR expires_at > $2)
                    RETURNING user_id, inserted_at
                    "#,
                )
                .bind(thread.partition_key())
                .bind(Utc::now())
                .fetch_all(&self.db.pool),
            )
            .await?;

        let mut retained = rows
            .iter()
            .map(|row| Ok((row.try_get::<DateTime<Utc>, _>("inserted_at")?, row.try_get("user_id")?)))
            .collect::<Result<Vec<(DateTime<Utc>, String)>, sqlx::Error>>()?;
        retained.sort();

        Ok(retained.into_iter().map(|(_, user_id)| user_id).collect())
    }

    async fn reap_expired(&self, now: DateTime<Utc>) -> BackendResult<usize> {
        let result = self
            .db
            .bounded(
                sqlx::query(
                    "DELETE FROM thread_followers WHERE expires_at IS NOT NULL AND expires_at <= $1",
                )
                .bind(now)
                .execute(&self.db.pool),
            )
            .await?;

        Ok(result.rows_affected() as usize)
    }
}

pub struct PgSubscriptionRegistry {
    db: PgHandle,
}

#[async_trait]
impl SubscriptionRegistry for PgSubscriptionRegistry {
    async fn open_connection(&self, connection_id: &str) -> BackendResult<()> {
        self.db
            .bounded(
                sqlx::query(
                    r#"
                    INSERT INTO thread_connections (connection_id, connected_at)
                    VALUES ($1, $2)
                    ON CONFLICT (connection_id) DO NOTHING
                    "#,
                )
                .bind(connection_id)
                .bind(Utc::now())
                .execute(&self.db.pool),
            )
            .await?;

        Ok(())
    }

    async fn subscribe(&self, thread: &ThreadId, connection_id: &str, user_id: &str) -> BackendResult<()> {
        let now = Utc::now();

        self.db
            .bounded(async {
                let mut tx = self.db.pool.begin().await?;

                let previous: Option<(Option<String>, Option<String>)> = sqlx::query_as(
                    "SELECT participant_id, item_id FROM thread_connections WHERE connection_id = $1 FOR UPDATE",
                )
                .bind(connection_id)
                .fetch_optional(&mut *tx)
                .await?;

                let previous = previous.and_then(|(participant_id, item_id)| {
                    thread_from_columns(participant_id, item_id)
                });
                if let Some(previous) = previous.filter(|previous| previous != thread) {
                    sqlx::query(
                        "DELETE FROM thread_subscriptions WHERE partition_key = $1 AND connection_id = $2",
                    )
                    .bind(previous.partition_key())
                    .bind(connection_id)
                    .execute(&mut *tx)
                    .await?;
                }

                sqlx::query(
                    r#"
                    INSERT INTO thread_connections (connection_id, connected_at, participant_id, item_id)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (connection_id)
                    DO UPDATE SET participant_id = EXCLUDED.participant_id, item_id = EXCLUDED.item_id
                    "#,
                )
                .bind(connection_id)
                .bind(now)
                .bind(&thread.participant_id)
                .bind(&thread.item_id)
                .execute(&mut *tx)
                .await?;

                sqlx::query(
                    r#"
                    INSERT INTO thread_subscriptions
                        (partition_key, connection_id, participant_id, item_id, user_id, subscribed_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (partition_key, connection_id)
                    DO UPDATE SET user_id = EXCLUDED.user_id
                    "#,
                )
                .bind(thread.partition_key())
                .bind(connection_id)
                .bind(&thread.participant_id)
                .bind(&thread.item_id)
                .bind(user_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                tx.commit().await
            })
            .await
    }

    async fn unsubscribe(&self, thread: &ThreadId, connection_id: &str) -> BackendResult<()> {
        self.db
            .bounded(async {
                let mut tx = self.db.pool.begin().await?;

                sqlx::query(
                    "DELETE FROM thread_subscriptions WHERE partition_key = $1 AND connection_id = $2",
                )
                .bind(thread.partition_key())
                .bind(connection_id)
                .execute(&mut *tx)
                .await?;

                sqlx::query(
                    r#"
                    UPDATE thread_connections
                    SET participant_id = NULL, item_id = NULL
                    WHERE connection_id = $1 AND participant_id = $2 AND item_id = $3
                    "#,
                )
                .bind(connection_id)
                .bind(&thread.participant_id)
                .bind(&thread.item_id)
                .execute(&mut *tx)
                .await?;

                tx.commit().await
            })
            .await
    }

    async fn list_subscribers(&self, thread: &ThreadId) -> BackendResult<Vec<Subscriber>> {
        let rows = self
            .db
            .bounded(
                sqlx::query(
                    r#"
                    SELECT connection_id, user_id
                    FROM thread_subscriptions
                    WHERE partition_key = $1
                    ORDER BY connection_id
                    "#,
                )
                .bind(thread.partition_key())
                .fetch_all(&self.db.pool),
            )
            .await?;

        let subscribers = rows
            .iter()
            .map(|row| {
                Ok(Subscriber {
                    connection_id: row.try_get("connection_id")?,
                    user_id: row.try_get("user_id")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(subscribers)
    }

    async fn close_connection(&self, connection_id: &str) -> BackendResult<Option<ThreadId>> {
        self.db
            .bounded(async {
                let mut tx = self.db.pool.begin().await?;

                let removed: Option<(Option<String>, Option<String>)> = sqlx::query_as(
                    "DELETE FROM thread_connections WHERE connection_id = $1 RETURNING participant_id, item_id",
                )
                .bind(connection_id)
                .fetch_optional(&mut *tx)
                .await?;

                let thread = removed.and_then(|(participant_id, item_id)| {
                    thread_from_columns(participant_id, item_id)
                });
                if let Some(thread) = &thread {
                    sqlx::query(
                        "DELETE FROM thread_subscriptions WHERE partition_key = $1 AND connection_id = $2",
                    )
                    .bind(thread.partition_key())
                    .bind(connection_id)
                    .execute(&mut *tx)
                    .await?;
                }

                tx.commit().await?;
                Ok::<_, sqlx::Error>(thread)
            })
            .await
    }

    async fn connection(&self, connection_id: &str) -> BackendResult<Option<ConnectionRecord>> {
        let row = self
            .db
            .bounded(
                sqlx::query(
                    r#"
                    SELECT connection_id, connected_at, participant_id, item_id
                    FROM thread_connections
                    WHERE connection_id = $1
                    "#,
                )
                .bind(connection_id)
                .fetch_optional(&self.db.pool),
            )
            .await?;

        let connection = row
            .map(|row| {
                Ok::<_, sqlx::Error>(ConnectionRecord {
                    connection_id: row.try_get("connection_id")?,
                    connected_at: row.try_get("connected_at")?,
                    subscription: thread_from_columns(
                        row.try_get("participant_id")?,
                        row.try_get("item_id")?,
                    ),
                })
            })
            .transpose()?;

        Ok(connection)
    }
}

/// Inserts tried before a mailbox key collision is reported
const NOTIFICATION_KEY_ATTEMPTS: usize = 4;

pub struct PgNotificationStore {
    db: PgHandle,
    clock: Arc<MonotonicClock>,
}

fn notification_from_row(row: &PgRow) -> Result<Notification, sqlx::Error> {
    let payload: Json<serde_json::Value> = row.try_get("payload")?;

    Ok(Notification {
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        notification_type: row.try_get("notification_type")?,
        payload: payload.0,
        read_time: row.try_get("read_time")?,
        expires_at: row.try_get("expires_at")?,
    })
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn record(
        &self,
        user_id: &str,
        notification_type: &str,
        payload: serde_json::Value,
        retention: Duration,
    ) -> BackendResult<Notification> {
        // `created_at` is the mailbox key; another instance may have taken
        // the same microsecond, in which case a later timestamp is tried.
        for _ in 0..NOTIFICATION_KEY_ATTEMPTS {
            let created_at = self.clock.next();
            let notification = Notification {
                user_id: user_id.to_string(),
                created_at,
                notification_type: notification_type.to_string(),
                payload: payload.clone(),
                read_time: None,
                expires_at: created_at + retention,
            };

            let result = self
                .db
                .bounded(
                    sqlx::query(
                        r#"
                        INSERT INTO notifications
                            (user_id, created_at, notification_type, payload, read_time, expires_at)
                        VALUES ($1, $2, $3, $4, NULL, $5)
                        ON CONFLICT (user_id, created_at) DO NOTHING
                        "#,
                    )
                    .bind(&notification.user_id)
                    .bind(notification.created_at)
                    .bind(&notification.notification_type)
                    .bind(Json(&notification.payload))
                    .bind(notification.expires_at)
                    .execute(&self.db.pool),
                )
                .await?;

            if result.rows_affected() > 0 {
                return Ok(notification);
            }
            tracing::debug!("[Store] Notification key {} taken for {}, retrying", created_at, user_id);
        }

        Err(BackendError::storage(format!(
            "no free notification key for {} after {} attempts",
            user_id, NOTIFICATION_KEY_ATTEMPTS
        )))
    }

    async fn list(&self, user_id: &str, limit: usize) -> BackendResult<Vec<Notification>> {
        let rows = self
            .db
            .bounded(
                sqlx::query(
                    r#"
                    SELECT user_id, created_at, notification_type, payload, read_time, expires_at
                    FROM notifications
                    WHERE user_id = $1 AND expires_at > $2
                    ORDER BY created_at DESC
                    LIMIT $3
                    "#,
                )
                .bind(user_id)
                .bind(Utc::now())
                .bind(i64::try_from(limit).unwrap_or(i64::MAX))
                .fetch_all(&self.db.pool),
            )
            .await?;

        Ok(rows
            .iter()
            .map(notification_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn mark_read(&self, user_id: &str, created_at: DateTime<Utc>) -> BackendResult<bool> {
        let result = self
            .db
            .bounded(
                sqlx::query(
                    r#"
                    UPDATE notifications
                    SET read_time = COALESCE(read_time, $3)
                    WHERE user_id = $1 AND created_at = $2 AND expires_at > $3
                    "#,
                )
                .bind(user_id)
                .bind(created_at)
                .bind(Utc::now())
                .execute(&self.db.pool),
            )
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn reap_expired(&self, now: DateTime<Utc>) -> BackendResult<usize> {
        let result = self
            .db
            .bounded(
                sqlx::query("DELETE FROM notifications WHERE expires_at <= $1")
                    .bind(now)
                    .execute(&self.db.pool),
            )
            .await?;

        Ok(result.rows_affected() as usize)
    }
}
