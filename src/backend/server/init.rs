/**
 * Server Initialization
 *
 * Builds the application from a loaded `ServerConfig`:
 *
 * 1. Build the capability verifier (RS256 public key or HS256 secret)
 * 2. Open the stores: PostgreSQL when `database_url` is set, memory otherwise
 * 3. Wire the dispatchers into `AppState`
 * 4. Start the expiry reaper
 * 5. Create the router
 *
 * A configured database that cannot be reached fails startup rather than
 * silently falling back to memory, since follows would then vanish on
 * restart.
 */

use axum::Router;

use crate::backend::error::BackendResult;
use crate::backend::routes::create_router;
use crate::backend::server::config::ServerConfig;
use crate::backend::server::state::{AppState, Retention};
use crate::backend::store::{spawn_reaper, Stores};

/// Create and configure the Axum application
///
/// # Errors
///
/// * `NotConfigured` - no usable capability key
/// * `StorageError` - the database is unreachable or migrations failed
pub async fn create_app(config: &ServerConfig) -> BackendResult<Router<()>> {
    tracing::info!("Initializing Threadwatch backend server");

    let verifier = config.verifier()?;

    let stores = match &config.database_url {
        Some(url) => Stores::connect(url, config.storage_timeout()).await?,
        None => {
            tracing::warn!("DATABASE_URL not set. Using in-memory stores; nothing survives a restart.");
            Stores::in_memory()
        }
    };

    let retention = Retention {
        follows: config.follow_retention(),
        notifications: config.notification_retention(),
    };
    let state = AppState::new(verifier, stores, retention);

    spawn_reaper(
        state.follows.clone(),
        state.notifications.clone(),
        config.reap_interval(),
    );

    let app = create_router(state);
    tracing::info!("Router configured with expiry reaper every {:?}", config.reap_interval());

    Ok(app)
}
