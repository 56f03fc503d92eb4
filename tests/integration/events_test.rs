//! Event fan-out integration tests
//!
//! Status transitions dispatched through the application's event dispatcher.

use chrono::{Duration, Utc};
use serde_json::json;
use threadwatch::backend::server::AppState;
use threadwatch::backend::store::FollowStore;
use threadwatch::shared::event::STATUS_CHANGED;
use threadwatch::shared::{EventEnvelope, ThreadId};

use crate::common::*;

fn status_event(former: &str, new: &str, updated_by: &str) -> EventEnvelope {
    EventEnvelope::new(
        STATUS_CHANGED,
        json!({
            "participantId": "alice",
            "itemId": "item-1",
            "formerStatus": former,
            "newStatus": new,
            "updatedById": updated_by,
        }),
    )
}

fn thread() -> ThreadId {
    ThreadId::new("alice", "item-1").unwrap()
}

async fn follower_ids(state: &AppState) -> Vec<String> {
    let mut ids: Vec<String> = state
        .follows
        .list_followers(&thread())
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.user_id)
        .collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_open_adds_participant_and_updater() {
    let state = test_state();
    state.follows.insert(&thread(), "alice", None).await.unwrap();

    let report = state
        .events
        .dispatch(status_event("not_started", "waiting_for_trainer", "bob"))
        .await;

    assert!(report.is_clean());
    assert_eq!(follower_ids(&state).await, vec!["alice", "bob"]);
}

#[tokio::test]
async fn test_close_expires_everyone_in_fourteen_days() {
    let state = test_state();
    state.follows.insert(&thread(), "alice", None).await.unwrap();
    state.follows.insert(&thread(), "bob", None).await.unwrap();

    let report = state
        .events
        .dispatch(status_event("waiting_for_trainer", "closed", "bob"))
        .await;

    assert!(report.is_clean());
    assert_eq!(follower_ids(&state).await, vec!["alice", "bob"]);

    let expected = Utc::now() + Duration::days(14);
    for user in ["alice", "bob"] {
        let record = state.follows.get(&thread(), user).await.unwrap().unwrap();
        let drift = (record.expires_at.unwrap() - expected).num_seconds().abs();
        assert!(drift <= 60, "{} expiry off by {}s", user, drift);
    }
}

#[tokio::test]
async fn test_close_then_reopen_clears_expiry() {
    let state = test_state();
    state.follows.insert(&thread(), "alice", None).await.unwrap();
    state.follows.insert(&thread(), "coach", None).await.unwrap();

    state
        .events
        .dispatch(status_event("waiting_for_participant", "closed", "coach"))
        .await;
    state
        .events
        .dispatch(status_event("closed", "waiting_for_participant", "alice"))
        .await;

    assert_eq!(follower_ids(&state).await, vec!["alice", "coach"]);
    for user in ["alice", "coach"] {
        let record = state.follows.get(&thread(), user).await.unwrap().unwrap();
        assert_eq!(record.expires_at, None);
    }
}

#[tokio::test]
async fn test_same_phase_transitions_leave_followers_alone() {
    let state = test_state();
    state.follows.insert(&thread(), "alice", None).await.unwrap();
    let before = state.follows.get(&thread(), "alice").await.unwrap();

    for (former, new) in [
        ("waiting_for_participant", "waiting_for_trainer"),
        ("not_started", "closed"),
        ("closed", "closed"),
    ] {
        let report = state.events.dispatch(status_event(former, new, "bob")).await;
        assert!(report.is_clean());
    }

    assert_eq!(follower_ids(&state).await, vec!["alice"]);
    assert_eq!(state.follows.get(&thread(), "alice").await.unwrap(), before);
}

#[tokio::test]
async fn test_bad_payload_is_reported_not_raised() {
    let state = test_state();

    let report = state
        .events
        .dispatch(EventEnvelope::new(STATUS_CHANGED, json!({ "newStatus": "reopened" })))
        .await;

    assert_eq!(report.handlers, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 0);
}

#[tokio::test]
async fn test_unknown_status_is_decoding_failure() {
    let state = test_state();

    let report = state
        .events
        .dispatch(status_event("closed", "archived", "bob"))
        .await;

    assert_eq!(report.failures.len(), 1);
    assert!(follower_ids(&state).await.is_empty());
}
