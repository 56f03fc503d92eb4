/**
 * Event Dispatcher
 *
 * Fans one inbound event envelope out to every handler registered for its
 * `type`.
 *
 * # Isolation
 *
 * Each handler runs on its own task and all of them are awaited together.
 * A handler that errors or panics is recorded in the `FanOutReport` and
 * logged with the envelope's type, id and source; it never prevents,
 * cancels or rolls back the others. There is no retry here. Redelivery is
 * the job of whatever publishes the events.
 */

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Serialize;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::realtime::dispatcher::panic_message;
use crate::shared::EventEnvelope;

/// Handler for one event type
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, envelope: Arc<EventEnvelope>) -> BackendResult<()>;
}

#[async_trait]
impl<F, Fut> EventHandler for F
where
    F: Fn(Arc<EventEnvelope>) -> Fut + Send + Sync,
    Fut: Future<Output = BackendResult<()>> + Send + 'static,
{
    async fn handle(&self, envelope: Arc<EventEnvelope>) -> BackendResult<()> {
        (self)(envelope).await
    }
}

/// Event type to handler list table
#[derive(Clone, Default)]
pub struct EventRoutes {
    handlers: HashMap<String, Vec<Arc<dyn EventHandler>>>,
}

impl EventRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `handler` to the list for `event_type`
    pub fn on<H>(mut self, event_type: &str, handler: H) -> Self
    where
        H: EventHandler + 'static,
    {
        self.handlers
            .entry(event_type.to_string())
            .or_default()
            .push(Arc::new(handler));
        self
    }

    pub fn handlers_for(&self, event_type: &str) -> &[Arc<dyn EventHandler>] {
        self.handlers.get(event_type).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One failed handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerFailure {
    /// Registration order of the handler within its event type
    pub index: usize,
    pub error: String,
}

/// Outcome of dispatching one envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanOutReport {
    #[serde(rename = "type")]
    pub event_type: String,
    pub handlers: usize,
    pub failures: Vec<HandlerFailure>,
}

impl FanOutReport {
    pub fn succeeded(&self) -> usize {
        self.handlers - self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct EventDispatcher {
    routes: EventRoutes,
}

impl EventDispatcher {
    pub fn new(routes: EventRoutes) -> Self {
        Self { routes }
    }

    /// Run every handler for `envelope.event_type` concurrently
    ///
    /// Unregistered types are a no-op, not an error.
    pub async fn dispatch(&self, envelope: EventEnvelope) -> FanOutReport {
        let handlers = self.routes.handlers_for(&envelope.event_type).to_vec();
        let mut report = FanOutReport {
            event_type: envelope.event_type.clone(),
            handlers: handlers.len(),
            failures: Vec::new(),
        };

        if handlers.is_empty() {
            tracing::debug!("[Events] No handlers for {}", envelope.event_type);
            return report;
        }

        let envelope = Arc::new(envelope);
        let tasks = handlers.into_iter().map(|handler| {
            let envelope = envelope.clone();
            tokio::spawn(async move { handler.handle(envelope).await })
        });
        let results = join_all(tasks).await;

        for (index, result) in results.into_iter().enumerate() {
            let error = match result {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(join_error) if join_error.is_panic() => {
                    BackendError::internal(panic_message(join_error.into_panic()))
                }
                Err(join_error) => BackendError::internal(join_error.to_string()),
            };

            tracing::error!(
                event_type = %envelope.event_type,
                event_id = envelope.metadata.id.as_deref().unwrap_or("-"),
                source = envelope.metadata.source.as_deref().unwrap_or("-"),
                handler = index,
                "[Events] Handler failed: {}",
                error
            );
            report.failures.push(HandlerFailure {
                index,
                error: error.message(),
            });
        }

        tracing::debug!(
            "[Events] {} handled by {}/{} handlers",
            report.event_type,
            report.succeeded(),
            report.handlers
        );
        report
    }
}
