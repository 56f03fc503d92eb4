/**
 * Forum Actions
 *
 * Live-channel handlers for thread watching, mounted under the `forum`
 * namespace:
 *
 * | action              | effect                                    |
 * |---------------------|-------------------------------------------|
 * | `forum.subscribe`   | live pushes for the thread on this socket |
 * | `forum.unsubscribe` | stop live pushes                          |
 * | `forum.follow`      | durable follow (mailbox notifications)    |
 * | `forum.unfollow`    | remove the durable follow                 |
 *
 * Every frame carries its own capability token in `token`. The token is
 * verified, then matched against the `participantId`/`itemId` the frame
 * names, before any store is touched.
 */

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::backend::auth::{Capability, TokenVerifier};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::realtime::dispatcher::{ActionHandler, ActionRoutes, ConnectionContext, LifecycleHandler};
use crate::backend::store::{FollowStore, SubscriptionRegistry};
use crate::shared::ActionMessage;

/// Namespace the thread actions are mounted under
pub const FORUM_NAMESPACE: &str = "forum";

/// Dependencies shared by the forum actions
#[derive(Clone)]
pub struct ForumContext {
    pub verifier: Arc<dyn TokenVerifier>,
    pub follows: Arc<dyn FollowStore>,
    pub subscriptions: Arc<dyn SubscriptionRegistry>,
}

impl ForumContext {
    /// Verify the frame's token and check it covers the thread the frame names
    fn authorize(&self, message: &ActionMessage) -> BackendResult<Capability> {
        let token = message
            .token
            .as_deref()
            .ok_or_else(|| BackendError::authentication("frame carries no capability token"))?;

        let capability = Capability::decode(token, self.verifier.as_ref())?;
        capability.match_route(&message.route_params())?;
        Ok(capability)
    }
}

pub struct Subscribe(ForumContext);
pub struct Unsubscribe(ForumContext);
pub struct Follow(ForumContext);
pub struct Unfollow(ForumContext);

#[async_trait]
impl ActionHandler for Subscribe {
    async fn handle(&self, ctx: ConnectionContext, message: ActionMessage) -> BackendResult<Value> {
        let capability = self.0.authorize(&message)?;
        capability.require_watch()?;

        self.0
            .subscriptions
            .subscribe(capability.thread(), &ctx.connection_id, capability.user_id())
            .await?;

        tracing::info!(
            connection_id = %ctx.connection_id,
            user_id = capability.user_id(),
            "[Realtime] Subscribed to {}",
            capability.thread()
        );
        Ok(json!({ "subscribed": capability.thread() }))
    }
}

#[async_trait]
impl ActionHandler for Unsubscribe {
    async fn handle(&self, ctx: ConnectionContext, message: ActionMessage) -> BackendResult<Value> {
        let capability = self.0.authorize(&message)?;

        self.0
            .subscriptions
            .unsubscribe(capability.thread(), &ctx.connection_id)
            .await?;

        tracing::info!(connection_id = %ctx.connection_id, "[Realtime] Unsubscribed from {}", capability.thread());
        Ok(json!({ "unsubscribed": capability.thread() }))
    }
}

#[async_trait]
impl ActionHandler for Follow {
    async fn handle(&self, _ctx: ConnectionContext, message: ActionMessage) -> BackendResult<Value> {
        let capability = self.0.authorize(&message)?;
        capability.require_watch()?;

        self.0
            .follows
            .insert(capability.thread(), capability.user_id(), None)
            .await?;

        Ok(json!({ "following": capability.thread() }))
    }
}

#[async_trait]
impl ActionHandler for Unfollow {
    async fn handle(&self, _ctx: ConnectionContext, message: ActionMessage) -> BackendResult<Value> {
        let capability = self.0.authorize(&message)?;

        self.0
            .follows
            .remove(capability.thread(), capability.user_id())
            .await?;

        Ok(json!({ "unfollowed": capability.thread() }))
    }
}

/// Records the connection so disconnect cleanup can find its subscription
pub struct OpenConnection(pub Arc<dyn SubscriptionRegistry>);

/// Drops the connection record and its live subscription
pub struct CloseConnection(pub Arc<dyn SubscriptionRegistry>);

#[async_trait]
impl LifecycleHandler for OpenConnection {
    async fn handle(&self, ctx: ConnectionContext) -> BackendResult<()> {
        self.0.open_connection(&ctx.connection_id).await
    }
}

#[async_trait]
impl LifecycleHandler for CloseConnection {
    async fn handle(&self, ctx: ConnectionContext) -> BackendResult<()> {
        if let Some(thread) = self.0.close_connection(&ctx.connection_id).await? {
            tracing::debug!(connection_id = %ctx.connection_id, "[Realtime] Dropped subscription to {}", thread);
        }
        Ok(())
    }
}

/// The `forum.*` action table
pub fn forum_routes(context: ForumContext) -> ActionRoutes {
    let forum = ActionRoutes::new()
        .route("subscribe", Subscribe(context.clone()))
        .route("unsubscribe", Unsubscribe(context.clone()))
        .route("follow", Follow(context.clone()))
        .route("unfollow", Unfollow(context));

    ActionRoutes::new().nest(FORUM_NAMESPACE, forum)
}
