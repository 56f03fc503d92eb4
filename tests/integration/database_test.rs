//! PostgreSQL store tests
//!
//! The follow, subscription and notification properties checked against the
//! in-memory stores, run against a live database.

use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serial_test::serial;
use threadwatch::backend::store::{FollowStore, NotificationStore, SubscriptionRegistry};
use threadwatch::shared::ThreadId;

use crate::common::database::*;

fn thread(prefix: &str, participant: &str, item: &str) -> ThreadId {
    ThreadId::new(format!("{}{}", prefix, participant), item).unwrap()
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
#[serial(database)]
async fn test_migrations_create_tables() {
    let pool = create_test_pool().await;
    connect_stores().await;

    for table in ["thread_followers", "thread_connections", "thread_subscriptions", "notifications"] {
        let result = sqlx::query(&format!("SELECT 1 FROM {} LIMIT 1", table))
            .execute(&pool)
            .await;
        assert!(result.is_ok(), "{} should exist", table);
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
#[serial(database)]
async fn test_insert_is_idempotent() {
    let pool = create_test_pool().await;
    let stores = connect_stores().await;
    let prefix = unique_prefix();
    let t = thread(&prefix, "p", "i");

    stores.follows.insert(&t, "alice", None).await.unwrap();
    let original = stores.follows.get(&t, "alice").await.unwrap().unwrap();
    stores.follows.insert(&t, "alice", Some(Duration::days(1))).await.unwrap();
    stores.follows.insert(&t, "alice", None).await.unwrap();

    let followers = stores.follows.list_followers(&t).await.unwrap();
    let current = stores.follows.get(&t, "alice").await.unwrap().unwrap();
    cleanup_test_data(&pool, &prefix).await.unwrap();

    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0].inserted_at, original.inserted_at);
    assert_eq!(current.expires_at, None);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
#[serial(database)]
async fn test_threads_are_isolated() {
    let pool = create_test_pool().await;
    let stores = connect_stores().await;
    let prefix = unique_prefix();
    let a = thread(&prefix, "a#b", "c");
    let b = thread(&prefix, "a", "b#c");

    stores.follows.insert(&a, "alice", None).await.unwrap();
    stores.subscriptions.subscribe(&a, &format!("{}-c1", prefix), "alice").await.unwrap();

    let exists_b = stores.follows.exists(&b, "alice").await.unwrap();
    let followers_b = stores.follows.list_followers(&b).await.unwrap();
    let subscribers_b = stores.subscriptions.list_subscribers(&b).await.unwrap();
    let subscribers_a = stores.subscriptions.list_subscribers(&a).await.unwrap();
    cleanup_test_data(&pool, &prefix).await.unwrap();

    assert!(!exists_b);
    assert!(followers_b.is_empty());
    assert!(subscribers_b.is_empty());
    assert_eq!(subscribers_a.len(), 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
#[serial(database)]
async fn test_expiry_round_trip_and_order() {
    let pool = create_test_pool().await;
    let stores = connect_stores().await;
    let prefix = unique_prefix();
    let t = thread(&prefix, "p", "i");
    let users = ["carol", "alice", "bob"];

    for user in users {
        stores.follows.insert(&t, user, None).await.unwrap();
    }
    let listed: Vec<String> = stores
        .follows
        .list_followers(&t)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.user_id)
        .collect();

    let expires_at = Utc::now() + Duration::days(14);
    stores.follows.set_expiry_for_all(&t, expires_at).await.unwrap();
    let mut expiries = Vec::new();
    for user in users {
        expiries.push(stores.follows.get(&t, user).await.unwrap().unwrap().expires_at);
    }

    let cleared: BTreeSet<String> = stores
        .follows
        .clear_expiry_for_all(&t)
        .await
        .unwrap()
        .into_iter()
        .collect();
    let mut remaining = 0;
    for user in users {
        if stores.follows.get(&t, user).await.unwrap().unwrap().expires_at.is_some() {
            remaining += 1;
        }
    }
    cleanup_test_data(&pool, &prefix).await.unwrap();

    assert_eq!(listed, vec!["carol", "alice", "bob"]);
    for expiry in expiries {
        // PostgreSQL keeps microseconds
        let drift = (expiry.unwrap() - expires_at).num_milliseconds().abs();
        assert!(drift < 1, "expiry off by {}ms", drift);
    }
    assert_eq!(cleared, users.iter().map(|u| u.to_string()).collect::<BTreeSet<_>>());
    assert_eq!(remaining, 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
#[serial(database)]
async fn test_missing_entries_resolve_without_error() {
    let stores = connect_stores().await;
    let prefix = unique_prefix();
    let t = thread(&prefix, "p", "i");
    let connection_id = format!("{}-ghost", prefix);

    stores.follows.remove(&t, "nobody").await.unwrap();
    stores.subscriptions.unsubscribe(&t, &connection_id).await.unwrap();
    assert_eq!(stores.subscriptions.close_connection(&connection_id).await.unwrap(), None);
    stores.follows.set_expiry_for_all(&t, Utc::now()).await.unwrap();
    assert!(stores.follows.clear_expiry_for_all(&t).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
#[serial(database)]
async fn test_resubscribe_and_close_connection() {
    let pool = create_test_pool().await;
    let stores = connect_stores().await;
    let prefix = unique_prefix();
    let first = thread(&prefix, "p", "i1");
    let second = thread(&prefix, "p", "i2");
    let connection_id = format!("{}-c1", prefix);

    stores.subscriptions.open_connection(&connection_id).await.unwrap();
    stores.subscriptions.subscribe(&first, &connection_id, "alice").await.unwrap();
    stores.subscriptions.subscribe(&second, &connection_id, "alice").await.unwrap();

    let on_first = stores.subscriptions.list_subscribers(&first).await.unwrap();
    let on_second = stores.subscriptions.list_subscribers(&second).await.unwrap();
    let closed = stores.subscriptions.close_connection(&connection_id).await.unwrap();
    let after_close = stores.subscriptions.list_subscribers(&second).await.unwrap();
    let record = stores.subscriptions.connection(&connection_id).await.unwrap();
    cleanup_test_data(&pool, &prefix).await.unwrap();

    assert!(on_first.is_empty());
    assert_eq!(on_second.len(), 1);
    assert_eq!(closed, Some(second));
    assert!(after_close.is_empty());
    assert!(record.is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
#[serial(database)]
async fn test_notifications_newest_first_and_mark_read() {
    let pool = create_test_pool().await;
    let stores = connect_stores().await;
    let prefix = unique_prefix();
    let user = format!("{}-alice", prefix);

    let first = stores
        .notifications
        .record(&user, "message", serde_json::json!({"n": 1}), Duration::days(30))
        .await
        .unwrap();
    stores
        .notifications
        .record(&user, "message", serde_json::json!({"n": 2}), Duration::days(30))
        .await
        .unwrap();

    let mailbox = stores.notifications.list(&user, 10).await.unwrap();
    let marked = stores.notifications.mark_read(&user, first.created_at).await.unwrap();
    let unknown = stores
        .notifications
        .mark_read(&user, first.created_at - Duration::seconds(1))
        .await
        .unwrap();
    let after = stores.notifications.list(&user, 10).await.unwrap();
    cleanup_test_data(&pool, &prefix).await.unwrap();

    assert_eq!(mailbox.len(), 2);
    assert_eq!(mailbox[0].payload["n"], 2);
    assert!(marked);
    assert!(!unknown);
    assert!(after[1].is_read());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
#[serial(database)]
async fn test_instances_share_a_mailbox_without_key_clashes() {
    let pool = create_test_pool().await;
    let one = connect_stores().await;
    let two = connect_stores().await;
    let prefix = unique_prefix();
    let user = format!("{}-alice", prefix);

    let mut recorded = 0;
    for n in 0..50 {
        let (a, b) = tokio::join!(
            one.notifications.record(&user, "message", serde_json::json!({"n": n}), Duration::days(1)),
            two.notifications.record(&user, "message", serde_json::json!({"n": n}), Duration::days(1)),
        );
        a.unwrap();
        b.unwrap();
        recorded += 2;
    }
    let listed = one.notifications.list(&user, 1000).await.unwrap().len();
    cleanup_test_data(&pool, &prefix).await.unwrap();

    assert_eq!(listed, recorded);
}
