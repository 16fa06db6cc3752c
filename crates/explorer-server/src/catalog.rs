//! Cached country collection.
//!
//! Every page that lists countries needs the full `/all` collection.  The
//! first successful fetch is kept for `ttl` so concurrent visitors do not
//! each hit the upstream API.  A refill runs once at a time: callers that
//! arrive during it wait and then read what it stored.  Failures are never
//! cached: the next request simply tries again.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use explorer_client::{ApiError, CountryApi, LISTING_FIELDS};
use explorer_shared::{Country, CountryCode};

#[derive(Debug, Clone)]
struct Cached {
    countries: Arc<Vec<Country>>,
    fetched_at: Instant,
}

impl Cached {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

pub struct CountryCatalog {
    api: Arc<dyn CountryApi>,
    ttl: Duration,
    cache: RwLock<Option<Cached>>,
    refill: Mutex<()>,
}

impl CountryCatalog {
    pub fn new(api: Arc<dyn CountryApi>, ttl: Duration) -> Self {
        Self {
            api,
            ttl,
            cache: RwLock::new(None),
            refill: Mutex::new(()),
        }
    }

    async fn fresh(&self) -> Option<Arc<Vec<Country>>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|c| c.is_fresh(self.ttl))
            .map(|c| c.countries.clone())
    }

    /// The full collection, from cache when fresh.
    pub async fn all(&self) -> Result<Arc<Vec<Country>>, ApiError> {
        if let Some(countries) = self.fresh().await {
            debug!(count = countries.len(), "Country collection served from cache");
            return Ok(countries);
        }

        let _refill = self.refill.lock().await;
        if let Some(countries) = self.fresh().await {
            debug!(count = countries.len(), "Country collection refilled by another request");
            return Ok(countries);
        }

        let countries = Arc::new(self.api.all_with_fields(&LISTING_FIELDS).await?);
        info!(count = countries.len(), "Country collection fetched");

        *self.cache.write().await = Some(Cached {
            countries: countries.clone(),
            fetched_at: Instant::now(),
        });
        Ok(countries)
    }

    /// A single country, always fetched fresh.
    pub async fn by_code(&self, code: &CountryCode) -> Result<Option<Country>, ApiError> {
        self.api.by_code(code).await
    }
}
