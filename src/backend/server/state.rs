/**
 * Application State Management
 *
 * `AppState` is the one state container shared by every HTTP handler and
 * every WebSocket connection. It is cheap to clone: every field is an `Arc`
 * or wraps one.
 *
 * # Wiring
 *
 * `AppState::new` builds the routing tables once at startup:
 *
 * - the connection dispatcher with the `forum.*` actions plus the connect
 *   and disconnect handlers
 * - the event dispatcher with the status reactor and the message notifier
 *
 * Tests build their own state over in-memory stores, so several
 * independent dispatchers can exist in one process.
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::auth::TokenVerifier;
use crate::backend::events::{thread_event_routes, EventDispatcher, MessagePostedNotifier, StatusChangeReactor};
use crate::backend::events::notify::DEFAULT_NOTIFICATION_RETENTION_DAYS;
use crate::backend::events::reactor::DEFAULT_CLOSED_RETENTION_DAYS;
use crate::backend::realtime::{
    forum_routes, CloseConnection, ConnectionDispatcher, ConnectionHub, ForumContext, OpenConnection,
    ThreadDelivery,
};
use crate::backend::store::{FollowStore, NotificationStore, Stores, SubscriptionRegistry};

/// How long expiring records are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    /// Follower lifetime after a thread closes
    pub follows: chrono::Duration,
    /// Mailbox entry lifetime
    pub notifications: chrono::Duration,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            follows: chrono::Duration::days(DEFAULT_CLOSED_RETENTION_DAYS),
            notifications: chrono::Duration::days(DEFAULT_NOTIFICATION_RETENTION_DAYS),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn TokenVerifier>,
    pub follows: Arc<dyn FollowStore>,
    pub subscriptions: Arc<dyn SubscriptionRegistry>,
    pub notifications: Arc<dyn NotificationStore>,
    /// Outbound queues of open WebSocket connections
    pub hub: ConnectionHub,
    pub dispatcher: Arc<ConnectionDispatcher>,
    pub events: Arc<EventDispatcher>,
}

impl AppState {
    pub fn new(verifier: Arc<dyn TokenVerifier>, stores: Stores, retention: Retention) -> Self {
        let hub = ConnectionHub::new();

        let forum = ForumContext {
            verifier: verifier.clone(),
            follows: stores.follows.clone(),
            subscriptions: stores.subscriptions.clone(),
        };
        let dispatcher = ConnectionDispatcher::new(forum_routes(forum))
            .on_connect(OpenConnection(stores.subscriptions.clone()))
            .on_disconnect(CloseConnection(stores.subscriptions.clone()));

        let delivery = ThreadDelivery::new(stores.subscriptions.clone(), Arc::new(hub.clone()));
        let reactor = StatusChangeReactor::new(stores.follows.clone(), retention.follows);
        let notifier = MessagePostedNotifier::new(
            stores.follows.clone(),
            stores.notifications.clone(),
            delivery,
            retention.notifications,
        );
        let events = EventDispatcher::new(thread_event_routes(reactor, notifier));

        Self {
            verifier,
            follows: stores.follows,
            subscriptions: stores.subscriptions,
            notifications: stores.notifications,
            hub,
            dispatcher: Arc::new(dispatcher),
            events: Arc::new(events),
        }
    }

    /// State over fresh in-memory stores with default retention
    pub fn in_memory(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self::new(verifier, Stores::in_memory(), Retention::default())
    }
}

impl FromRef<AppState> for Arc<EventDispatcher> {
    fn from_ref(state: &AppState) -> Self {
        state.events.clone()
    }
}

impl FromRef<AppState> for ConnectionHub {
    fn from_ref(state: &AppState) -> Self {
        state.hub.clone()
    }
}
