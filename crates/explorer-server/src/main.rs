//! # explorer-server
//!
//! HTTP front end for Country Explorer.
//!
//! This binary provides:
//! - **Pages** at the client routes (`/`, `/country/:code`, `/favorites`,
//!   `/login`, `/delete-account`) as JSON view-models
//! - **Session API** under `/api` for sign-in, favorites and account deletion
//! - **Country catalog** cached from the REST Countries API
//! - **Favorites** persisted in a local SQLite database

mod api;
mod catalog;
mod config;
mod error;
mod sessions;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use explorer_client::{
    ApiConfig, FavoritesStore, LocalIdentityProvider, RestCountriesClient, SqliteFavoritesStore,
};
use explorer_shared::constants::APP_NAME;
use explorer_store::Database;

use crate::api::AppState;
use crate::catalog::CountryCatalog;
use crate::config::{DatabaseLocation, ServerConfig};
use crate::sessions::SessionRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,explorer_server=debug,explorer_client=debug")
        }))
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let client = RestCountriesClient::new(&ApiConfig {
        base_url: config.api_base_url.clone(),
        timeout: config.api_timeout,
    })?;
    let catalog = Arc::new(CountryCatalog::new(Arc::new(client), config.catalog_ttl));

    let db = match &config.database {
        DatabaseLocation::Default => Database::new()?,
        DatabaseLocation::Memory => Database::open_in_memory()?,
        DatabaseLocation::File(path) => Database::open_at(path)?,
    };
    match db.path() {
        Some(path) => info!(path = %path.display(), "Favorites database opened"),
        None => info!("Favorites database is in memory; nothing will persist"),
    }
    let store: Arc<dyn FavoritesStore> = Arc::new(SqliteFavoritesStore::new(db));

    let sessions = SessionRegistry::new(Arc::new(LocalIdentityProvider::new()), store);

    let app_state = AppState {
        catalog,
        sessions: sessions.clone(),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic idle-session cleanup
    let idle = config.session_idle;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            sessions.purge_idle(idle).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
