/**
 * Connection Dispatcher
 *
 * Routes the three live-connection lifecycle events (connect, message,
 * disconnect) to registered handlers and turns every outcome into a
 * `DispatchResponse`.
 *
 * # Action Routing
 *
 * Message frames are routed by their `action` field through an
 * `ActionRoutes` table. Tables compose the way axum routers do:
 *
 * ```rust,ignore
 * let forum = ActionRoutes::new()
 *     .route("subscribe", Subscribe::new(deps.clone()))
 *     .route("unsubscribe", Unsubscribe::new(deps));
 *
 * let routes = ActionRoutes::new().nest("forum", forum);
 * // frames must now say {"action": "forum.subscribe", ...}
 * ```
 *
 * # Failure Containment
 *
 * Decode failures, unknown actions, handler errors and handler panics are all
 * converted to an error response for that one frame. The connection itself
 * stays open.
 */

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use serde_json::Value;

use crate::backend::error::{BackendError, BackendResult};
use crate::shared::{ActionMessage, DispatchResponse};

/// Per-dispatch view of the connection a frame arrived on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionContext {
    pub connection_id: String,
}

impl ConnectionContext {
    pub fn new(connection_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
        }
    }
}

/// Handler for one named action
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, ctx: ConnectionContext, message: ActionMessage) -> BackendResult<Value>;
}

#[async_trait]
impl<F, Fut> ActionHandler for F
where
    F: Fn(ConnectionContext, ActionMessage) -> Fut + Send + Sync,
    Fut: Future<Output = BackendResult<Value>> + Send + 'static,
{
    async fn handle(&self, ctx: ConnectionContext, message: ActionMessage) -> BackendResult<Value> {
        (self)(ctx, message).await
    }
}

/// Handler for connect or disconnect
#[async_trait]
pub trait LifecycleHandler: Send + Sync {
    async fn handle(&self, ctx: ConnectionContext) -> BackendResult<()>;
}

#[async_trait]
impl<F, Fut> LifecycleHandler for F
where
    F: Fn(ConnectionContext) -> Fut + Send + Sync,
    Fut: Future<Output = BackendResult<()>> + Send + 'static,
{
    async fn handle(&self, ctx: ConnectionContext) -> BackendResult<()> {
        (self)(ctx).await
    }
}

/// Action name to handler table
#[derive(Clone, Default)]
pub struct ActionRoutes {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `action`
    ///
    /// Registering the same name twice keeps the later handler.
    pub fn route<H>(mut self, action: &str, handler: H) -> Self
    where
        H: ActionHandler + 'static,
    {
        if self.handlers.insert(action.to_string(), Arc::new(handler)).is_some() {
            tracing::warn!("[Realtime] Action '{}' registered twice, keeping the later handler", action);
        }
        self
    }

    /// Mount every action of `routes` under `prefix.`
    pub fn nest(mut self, prefix: &str, routes: ActionRoutes) -> Self {
        for (action, handler) in routes.handlers {
            let qualified = format!("{}.{}", prefix, action);
            if self.handlers.insert(qualified.clone(), handler).is_some() {
                tracing::warn!("[Realtime] Action '{}' registered twice, keeping the later handler", qualified);
            }
        }
        self
    }

    pub fn get(&self, action: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(action).cloned()
    }

    /// Registered action names, sorted
    pub fn actions(&self) -> Vec<String> {
        let mut actions: Vec<String> = self.handlers.keys().cloned().collect();
        actions.sort();
        actions
    }
}

/// Lifecycle and action router for live connections
pub struct ConnectionDispatcher {
    routes: ActionRoutes,
    on_connect: Option<Arc<dyn LifecycleHandler>>,
    on_disconnect: Option<Arc<dyn LifecycleHandler>>,
}

impl ConnectionDispatcher {
    pub fn new(routes: ActionRoutes) -> Self {
        Self {
            routes,
            on_connect: None,
            on_disconnect: None,
        }
    }

    pub fn on_connect<H>(mut self, handler: H) -> Self
    where
        H: LifecycleHandler + 'static,
    {
        self.on_connect = Some(Arc::new(handler));
        self
    }

    pub fn on_disconnect<H>(mut self, handler: H) -> Self
    where
        H: LifecycleHandler + 'static,
    {
        self.on_disconnect = Some(Arc::new(handler));
        self
    }

    pub fn routes(&self) -> &ActionRoutes {
        &self.routes
    }

    /// Run the connect handler, acknowledging by default
    pub async fn connect(&self, connection_id: &str) -> DispatchResponse {
        tracing::debug!(connection_id, "[Realtime] Connect");
        self.run_lifecycle(self.on_connect.clone(), connection_id, "connect").await
    }

    /// Run the disconnect handler, acknowledging by default
    pub async fn disconnect(&self, connection_id: &str) -> DispatchResponse {
        tracing::debug!(connection_id, "[Realtime] Disconnect");
        self.run_lifecycle(self.on_disconnect.clone(), connection_id, "disconnect").await
    }

    /// Decode one inbound frame and route it by action name
    ///
    /// Never fails: every error becomes a response with the error's status.
    pub async fn message(&self, raw: &[u8], connection_id: &str) -> DispatchResponse {
        match self.route_message(raw, connection_id).await {
            Ok(body) => DispatchResponse::ack(body),
            Err(e) => {
                if e.status_code().is_server_error() {
                    tracing::error!(connection_id, "[Realtime] Frame failed: {}", e);
                } else {
                    tracing::debug!(connection_id, "[Realtime] Frame rejected: {}", e);
                }
                DispatchResponse::from(&e)
            }
        }
    }

    async fn route_message(&self, raw: &[u8], connection_id: &str) -> BackendResult<Value> {
        let message = ActionMessage::decode(raw)?;
        let handler = self
            .routes
            .get(&message.action)
            .ok_or_else(|| BackendError::route_not_found(message.action.clone()))?;

        tracing::debug!(connection_id, action = %message.action, "[Realtime] Routing frame");
        let ctx = ConnectionContext::new(connection_id);

        match AssertUnwindSafe(handler.handle(ctx, message)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(BackendError::internal(panic_message(panic))),
        }
    }

    async fn run_lifecycle(
        &self,
        handler: Option<Arc<dyn LifecycleHandler>>,
        connection_id: &str,
        phase: &str,
    ) -> DispatchResponse {
        let Some(handler) = handler else {
            return DispatchResponse::ack(Value::Null);
        };

        let ctx = ConnectionContext::new(connection_id);
        let result = match AssertUnwindSafe(handler.handle(ctx)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(BackendError::internal(panic_message(panic))),
        };

        match result {
            Ok(()) => DispatchResponse::ack(Value::Null),
            Err(e) => {
                tracing::error!(connection_id, "[Realtime] {} handler failed: {}", phase, e);
                DispatchResponse::from(&e)
            }
        }
    }
}

pub(crate) fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("handler panicked: {}", message)
    } else {
        "handler panicked".to_string()
    }
}
