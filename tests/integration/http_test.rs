//! HTTP API integration tests
//!
//! Drives the full router with `tower::ServiceExt::oneshot`.

use axum::http::{Method, StatusCode};
use serde_json::json;
use threadwatch::backend::store::FollowStore;
use threadwatch::shared::event::MESSAGE_POSTED;
use threadwatch::shared::ThreadId;
use tower::ServiceExt;

use crate::common::*;

const FOLLOW: &str = "/threads/alice/item-1/follow";
const FOLLOWERS: &str = "/threads/alice/item-1/followers";

#[tokio::test]
async fn test_follow_is_idempotent() {
    let (app, _) = test_app();
    let token = token_for("alice", "item-1", "coach");

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(request(Method::PUT, FOLLOW, Some(&token), None))
            .await
            .unwrap();
        expect_status(response, StatusCode::NO_CONTENT).await;
    }

    let response = app
        .oneshot(request(Method::GET, FOLLOWERS, Some(&token), None))
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::OK).await;

    assert_eq!(body["thread"]["participantId"], "alice");
    let followers = body["followers"].as_array().unwrap();
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0]["userId"], "coach");
}

#[tokio::test]
async fn test_token_for_other_thread_is_forbidden() {
    let (app, state) = test_app();
    let token = token_for("alice", "item-2", "coach");

    let response = app
        .oneshot(request(Method::PUT, FOLLOW, Some(&token), None))
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::FORBIDDEN).await;
    assert_eq!(body["status"], 403);

    let thread = ThreadId::new("alice", "item-1").unwrap();
    assert!(state.follows.list_followers(&thread).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let (app, _) = test_app();

    let response = app
        .clone()
        .oneshot(request(Method::PUT, FOLLOW, None, None))
        .await
        .unwrap();
    expect_status(response, StatusCode::UNAUTHORIZED).await;

    let response = app
        .clone()
        .oneshot(request(Method::PUT, FOLLOW, Some("not.a.jwt"), None))
        .await
        .unwrap();
    expect_status(response, StatusCode::UNAUTHORIZED).await;

    let mut expired = claims("alice", "item-1", "coach");
    expired.exp = (chrono::Utc::now().timestamp() - 3600) as u64;
    let response = app
        .oneshot(request(Method::PUT, FOLLOW, Some(&sign(&expired)), None))
        .await
        .unwrap();
    expect_status(response, StatusCode::UNAUTHORIZED).await;
}

#[tokio::test]
async fn test_follow_requires_watch_right() {
    let (app, _) = test_app();
    let mut no_watch = claims("alice", "item-1", "coach");
    no_watch.can_watch = false;

    let response = app
        .oneshot(request(Method::PUT, FOLLOW, Some(&sign(&no_watch)), None))
        .await
        .unwrap();
    expect_status(response, StatusCode::FORBIDDEN).await;
}

#[tokio::test]
async fn test_unfollow_without_follow_succeeds() {
    let (app, _) = test_app();
    let token = token_for("alice", "item-1", "coach");

    let response = app
        .oneshot(request(Method::DELETE, FOLLOW, Some(&token), None))
        .await
        .unwrap();
    expect_status(response, StatusCode::NO_CONTENT).await;
}

#[tokio::test]
async fn test_message_posted_reaches_mailbox() {
    let (app, _) = test_app();
    let coach = token_for("alice", "item-1", "coach");

    let response = app
        .clone()
        .oneshot(request(Method::PUT, FOLLOW, Some(&coach), None))
        .await
        .unwrap();
    expect_status(response, StatusCode::NO_CONTENT).await;

    let event = json!({
        "type": MESSAGE_POSTED,
        "payload": {
            "participantId": "alice",
            "itemId": "item-1",
            "authorId": "alice",
            "messageId": "m-1",
            "preview": "hi coach"
        },
        "metadata": { "id": "evt-1", "source": "messages" }
    });
    let response = app
        .clone()
        .oneshot(request(Method::POST, "/events", None, Some(event)))
        .await
        .unwrap();
    let report = expect_status(response, StatusCode::OK).await;
    assert_eq!(report["handlers"], 1);
    assert_eq!(report["failures"], json!([]));

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/notifications", Some(&coach), None))
        .await
        .unwrap();
    let inbox = expect_status(response, StatusCode::OK).await;
    let inbox = inbox.as_array().unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0]["payload"]["preview"], "hi coach");
    assert_eq!(inbox[0]["readTime"], serde_json::Value::Null);

    let created_at = inbox[0]["createdAt"].as_str().unwrap().to_string();
    let uri = format!("/notifications/{}/read", created_at);
    let response = app
        .clone()
        .oneshot(request(Method::POST, &uri, Some(&coach), None))
        .await
        .unwrap();
    expect_status(response, StatusCode::NO_CONTENT).await;

    let response = app
        .oneshot(request(Method::GET, "/notifications", Some(&coach), None))
        .await
        .unwrap();
    let inbox = expect_status(response, StatusCode::OK).await;
    assert!(inbox[0]["readTime"].is_string());
}

#[tokio::test]
async fn test_mark_unknown_notification_is_not_found() {
    let (app, _) = test_app();
    let token = token_for("alice", "item-1", "coach");

    let response = app
        .oneshot(request(
            Method::POST,
            "/notifications/2020-01-01T00:00:00Z/read",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    expect_status(response, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn test_events_endpoint_rejects_garbage() {
    let (app, _) = test_app();

    let response = app
        .clone()
        .oneshot(request(Method::POST, "/events", None, Some(json!({ "payload": {} }))))
        .await
        .unwrap();
    expect_status(response, StatusCode::BAD_REQUEST).await;

    let response = app
        .oneshot(request(Method::POST, "/events", None, Some(json!({ "type": "unheard.of" }))))
        .await
        .unwrap();
    let report = expect_status(response, StatusCode::OK).await;
    assert_eq!(report["handlers"], 0);
}

#[tokio::test]
async fn test_health_and_fallback() {
    let (app, _) = test_app();

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/health", None, None))
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["connections"], 0);

    let response = app
        .oneshot(request(Method::GET, "/nope", None, None))
        .await
        .unwrap();
    expect_status(response, StatusCode::NOT_FOUND).await;
}
