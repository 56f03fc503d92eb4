//! Live connection integration tests
//!
//! Frames go through the application's connection dispatcher with real
//! signed capability tokens; pushes are read from the hub queue the socket
//! writer would drain.

use serde_json::{json, Value};
use threadwatch::backend::store::SubscriptionRegistry;
use threadwatch::shared::event::MESSAGE_POSTED;
use threadwatch::shared::{EventEnvelope, ThreadId};

use crate::common::*;

fn frame(action: &str, token: &str, participant_id: &str, item_id: &str) -> Vec<u8> {
    json!({
        "action": action,
        "token": token,
        "participantId": participant_id,
        "itemId": item_id,
    })
    .to_string()
    .into_bytes()
}

fn message_posted(item_id: &str) -> EventEnvelope {
    EventEnvelope::new(
        MESSAGE_POSTED,
        json!({
            "participantId": "alice",
            "itemId": item_id,
            "authorId": "alice",
            "messageId": "m-1",
        }),
    )
}

#[tokio::test]
async fn test_subscriber_receives_push() {
    let state = test_state();
    let mut socket = state.hub.register("c1").await;
    assert!(state.dispatcher.connect("c1").await.is_success());

    let token = token_for("alice", "item-1", "coach");
    let response = state
        .dispatcher
        .message(&frame("forum.subscribe", &token, "alice", "item-1"), "c1")
        .await;
    assert_eq!(response.status, 200);

    let report = state.events.dispatch(message_posted("item-1")).await;
    assert!(report.is_clean());

    let pushed: Value = serde_json::from_str(&socket.recv().await.unwrap()).unwrap();
    assert_eq!(pushed["type"], MESSAGE_POSTED);
    assert_eq!(pushed["payload"]["messageId"], "m-1");
}

#[tokio::test]
async fn test_unprefixed_action_is_not_routed() {
    let state = test_state();
    let token = token_for("alice", "item-1", "coach");

    let response = state
        .dispatcher
        .message(&frame("subscribe", &token, "alice", "item-1"), "c1")
        .await;

    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_resubscribe_moves_connection() {
    let state = test_state();
    state.dispatcher.connect("c1").await;
    let first = ThreadId::new("alice", "item-1").unwrap();
    let second = ThreadId::new("alice", "item-2").unwrap();

    for item in ["item-1", "item-2"] {
        let token = token_for("alice", item, "coach");
        let response = state
            .dispatcher
            .message(&frame("forum.subscribe", &token, "alice", item), "c1")
            .await;
        assert_eq!(response.status, 200);
    }

    assert!(state.subscriptions.list_subscribers(&first).await.unwrap().is_empty());
    assert_eq!(state.subscriptions.list_subscribers(&second).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_disconnect_removes_subscription() {
    let state = test_state();
    let thread = ThreadId::new("alice", "item-1").unwrap();
    state.dispatcher.connect("c1").await;

    let token = token_for("alice", "item-1", "coach");
    state
        .dispatcher
        .message(&frame("forum.subscribe", &token, "alice", "item-1"), "c1")
        .await;
    assert!(state.dispatcher.disconnect("c1").await.is_success());

    assert!(state.subscriptions.list_subscribers(&thread).await.unwrap().is_empty());
    assert!(state.subscriptions.connection("c1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_gone_connection_is_pruned_on_push() {
    let state = test_state();
    let thread = ThreadId::new("alice", "item-1").unwrap();

    // subscribed but never registered with the hub, as after a dropped socket
    state.dispatcher.connect("ghost").await;
    let token = token_for("alice", "item-1", "coach");
    state
        .dispatcher
        .message(&frame("forum.subscribe", &token, "alice", "item-1"), "ghost")
        .await;

    let report = state.events.dispatch(message_posted("item-1")).await;

    assert!(report.is_clean());
    assert!(state.subscriptions.list_subscribers(&thread).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bad_frames_do_not_break_connection() {
    let state = test_state();
    state.dispatcher.connect("c1").await;
    let token = token_for("alice", "item-1", "coach");

    assert_eq!(state.dispatcher.message(b"\xff\xfe", "c1").await.status, 400);
    assert_eq!(
        state
            .dispatcher
            .message(&frame("forum.follow", "garbage", "alice", "item-1"), "c1")
            .await
            .status,
        401
    );
    assert_eq!(
        state
            .dispatcher
            .message(&frame("forum.follow", &token, "alice", "item-9"), "c1")
            .await
            .status,
        403
    );
    assert_eq!(
        state
            .dispatcher
            .message(&frame("forum.follow", &token, "alice", "item-1"), "c1")
            .await
            .status,
        200
    );
}
