//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use explorer_shared::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_HTTP_PORT, DEFAULT_PAGE_SIZE,
};
use explorer_shared::MatchMode;

/// `DATABASE_PATH` value selecting a throwaway in-memory database.
const IN_MEMORY: &str = ":memory:";

/// Where favorites are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// Platform data directory.
    Default,
    /// In memory, lost on exit.
    Memory,
    File(PathBuf),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// REST Countries base URL.
    /// Env: `COUNTRIES_API_URL`
    pub api_base_url: String,

    /// Per-request timeout for the REST Countries API.
    /// Env: `COUNTRIES_API_TIMEOUT_SECS`
    /// Default: `10`
    pub api_timeout: Duration,

    /// Env: `DATABASE_PATH` (`:memory:` for an ephemeral database)
    pub database: DatabaseLocation,

    /// Country cards per listing page.
    /// Env: `PAGE_SIZE`
    /// Default: `24`
    pub page_size: usize,

    /// How the search box matches country names.
    /// Env: `SEARCH_MODE` (`prefix` | `substring`)
    /// Default: `prefix`
    pub search_mode: MatchMode,

    /// How long a fetched country collection is served before refetching.
    /// Env: `CATALOG_TTL_SECS` (`0` disables caching)
    /// Default: `3600`
    pub catalog_ttl: Duration,

    /// Sessions unused for this long are dropped.
    /// Env: `SESSION_IDLE_SECS`
    /// Default: `86400`
    pub session_idle: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            database: DatabaseLocation::Default,
            page_size: DEFAULT_PAGE_SIZE,
            search_mode: MatchMode::Prefix,
            catalog_ttl: Duration::from_secs(3600),
            session_idle: Duration::from_secs(24 * 3600),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Invalid values are
    /// logged and replaced by their defaults.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(url) = var("COUNTRIES_API_URL") {
            if !url.trim().is_empty() {
                config.api_base_url = url.trim().to_string();
            }
        }

        if let Some(secs) = parse_secs(&var, "COUNTRIES_API_TIMEOUT_SECS") {
            if secs == 0 {
                tracing::warn!("COUNTRIES_API_TIMEOUT_SECS must be positive, using default");
            } else {
                config.api_timeout = Duration::from_secs(secs);
            }
        }

        if let Some(path) = var("DATABASE_PATH") {
            config.database = match path.trim() {
                "" => DatabaseLocation::Default,
                IN_MEMORY => DatabaseLocation::Memory,
                other => DatabaseLocation::File(PathBuf::from(other)),
            };
        }

        if let Some(val) = var("PAGE_SIZE") {
            match val.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.page_size = n,
                _ => tracing::warn!(value = %val, "Invalid PAGE_SIZE, using default"),
            }
        }

        if let Some(val) = var("SEARCH_MODE") {
            match val.parse::<MatchMode>() {
                Ok(mode) => config.search_mode = mode,
                Err(e) => tracing::warn!(error = %e, "Invalid SEARCH_MODE, using default"),
            }
        }

        if let Some(secs) = parse_secs(&var, "CATALOG_TTL_SECS") {
            config.catalog_ttl = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_secs(&var, "SESSION_IDLE_SECS") {
            config.session_idle = Duration::from_secs(secs);
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

fn parse_secs(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let val = var(key)?;
    match val.trim().parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(_) => {
            tracing::warn!(key, value = %val, "Invalid duration, using default");
            None
        }
    }
}
