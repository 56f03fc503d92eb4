//! Property-based tests for the follow store

use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use proptest::prelude::*;
use threadwatch::backend::store::{FollowStore, MemoryFollowStore};
use threadwatch::shared::ThreadId;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn user_ids() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-z]{1,8}", 0..12)
}

/// Small alphabet including the key separator and escape, so collisions are likely
fn thread_parts() -> impl Strategy<Value = (String, String)> {
    ("[ab#\\\\]{1,4}", "[ab#\\\\]{1,4}")
}

proptest! {
    #[test]
    fn test_repeated_insert_keeps_one_record(user in "[a-z]{1,8}", repeats in 1usize..8) {
        let store = MemoryFollowStore::new();
        let thread = ThreadId::new("p", "i").unwrap();

        let (count, first, last) = runtime().block_on(async {
            store.insert(&thread, &user, None).await.unwrap();
            let first = store.get(&thread, &user).await.unwrap().unwrap().inserted_at;
            for _ in 0..repeats {
                store.insert(&thread, &user, None).await.unwrap();
            }
            let last = store.get(&thread, &user).await.unwrap().unwrap().inserted_at;
            (store.list_followers(&thread).await.unwrap().len(), first, last)
        });

        prop_assert_eq!(count, 1);
        prop_assert_eq!(first, last);
    }

    #[test]
    fn test_threads_are_isolated(
        a in thread_parts(),
        b in thread_parts(),
        users_a in user_ids(),
        users_b in user_ids(),
    ) {
        prop_assume!(a != b);
        let store = MemoryFollowStore::new();
        let thread_a = ThreadId::new(a.0, a.1).unwrap();
        let thread_b = ThreadId::new(b.0, b.1).unwrap();

        let seen_b: BTreeSet<String> = runtime().block_on(async {
            for user in &users_a {
                store.insert(&thread_a, user, None).await.unwrap();
            }
            for user in &users_b {
                store.insert(&thread_b, user, None).await.unwrap();
            }
            store
                .list_followers(&thread_b)
                .await
                .unwrap()
                .into_iter()
                .map(|f| f.user_id)
                .collect()
        });

        prop_assert_eq!(seen_b, users_b);
    }

    #[test]
    fn test_distinct_threads_have_distinct_partition_keys(a in thread_parts(), b in thread_parts()) {
        prop_assume!(a != b);
        let thread_a = ThreadId::new(a.0, a.1).unwrap();
        let thread_b = ThreadId::new(b.0, b.1).unwrap();

        prop_assert_ne!(thread_a.partition_key(), thread_b.partition_key());
    }

    #[test]
    fn test_expiry_round_trip(users in user_ids()) {
        let store = MemoryFollowStore::new();
        let thread = ThreadId::new("p", "i").unwrap();

        let (cleared, remaining_expiries) = runtime().block_on(async {
            for user in &users {
                store.insert(&thread, user, None).await.unwrap();
            }
            store
                .set_expiry_for_all(&thread, Utc::now() + Duration::days(14))
                .await
                .unwrap();
            let cleared: BTreeSet<String> = store
                .clear_expiry_for_all(&thread)
                .await
                .unwrap()
                .into_iter()
                .collect();

            let mut remaining = 0;
            for user in &users {
                if store.get(&thread, user).await.unwrap().unwrap().expires_at.is_some() {
                    remaining += 1;
                }
            }
            (cleared, remaining)
        });

        prop_assert_eq!(cleared, users);
        prop_assert_eq!(remaining_expiries, 0);
    }

    #[test]
    fn test_followers_listed_in_insertion_order(users in prop::collection::vec("[a-z]{1,8}", 1..10)) {
        let store = MemoryFollowStore::new();
        let thread = ThreadId::new("p", "i").unwrap();

        let listed: Vec<String> = runtime().block_on(async {
            for user in &users {
                store.insert(&thread, user, None).await.unwrap();
            }
            store
                .list_followers(&thread)
                .await
                .unwrap()
                .into_iter()
                .map(|f| f.user_id)
                .collect()
        });

        let mut expected = Vec::new();
        for user in users {
            if !expected.contains(&user) {
                expected.push(user);
            }
        }
        prop_assert_eq!(listed, expected);
    }
}
