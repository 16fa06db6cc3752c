//! Per-user favorites document seam.
//!
//! A document holds one array-valued field: the user's favorite country
//! codes.  `add` and `remove` have array-union / array-remove semantics, and
//! the last write wins: there is no conflict detection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use explorer_shared::{CountryCode, Favorites, UserId};
use explorer_store::{Database, StoreError};

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No favorites document for {0}")]
    Missing(UserId),

    #[error("Favorites store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// Load the user's favorites, creating an empty document if absent.
    async fn load_or_create(
        &self,
        uid: &UserId,
        display_name: Option<&str>,
    ) -> Result<Favorites, FavoritesError>;

    async fn add(&self, uid: &UserId, code: &CountryCode) -> Result<(), FavoritesError>;

    async fn remove(&self, uid: &UserId, code: &CountryCode) -> Result<(), FavoritesError>;

    /// Delete the whole document. Deleting a missing document succeeds.
    async fn delete(&self, uid: &UserId) -> Result<(), FavoritesError>;
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

/// [`FavoritesStore`] over the local SQLite database.
#[derive(Clone)]
pub struct SqliteFavoritesStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteFavoritesStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Run `f` against the database on the blocking pool. SQLite calls and
    /// the connection lock both block, so they stay off the async workers.
    async fn with_db<T, F>(&self, f: F) -> Result<T, FavoritesError>
    where
        F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| FavoritesError::Unavailable(format!("Lock poisoned: {e}")))?;
            Ok(f(&*guard)?)
        })
        .await
        .map_err(|e| FavoritesError::Unavailable(format!("Store task failed: {e}")))?
    }
}

#[async_trait]
impl FavoritesStore for SqliteFavoritesStore {
    async fn load_or_create(
        &self,
        uid: &UserId,
        display_name: Option<&str>,
    ) -> Result<Favorites, FavoritesError> {
        let uid = uid.clone();
        let display_name = display_name.map(str::to_string);
        self.with_db(move |db| {
            db.ensure_user(&uid, display_name.as_deref())?;
            db.list_favorites(&uid)
        })
        .await
    }

    async fn add(&self, uid: &UserId, code: &CountryCode) -> Result<(), FavoritesError> {
        let (owner, code) = (uid.clone(), code.clone());
        self.with_db(move |db| db.add_favorite(&owner, &code))
            .await
            .map_err(|e| missing_as(uid, e))?;
        Ok(())
    }

    async fn remove(&self, uid: &UserId, code: &CountryCode) -> Result<(), FavoritesError> {
        let (owner, code) = (uid.clone(), code.clone());
        self.with_db(move |db| db.remove_favorite(&owner, &code))
            .await
            .map_err(|e| missing_as(uid, e))?;
        Ok(())
    }

    async fn delete(&self, uid: &UserId) -> Result<(), FavoritesError> {
        let owner = uid.clone();
        let removed = self.with_db(move |db| db.delete_user(&owner)).await?;
        tracing::debug!(uid = uid.short(), removed, "favorites document deleted");
        Ok(())
    }
}

fn missing_as(uid: &UserId, e: FavoritesError) -> FavoritesError {
    match e {
        FavoritesError::Store(StoreError::NotFound) => FavoritesError::Missing(uid.clone()),
        other => other,
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

/// [`FavoritesStore`] that keeps documents in a map. Nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryFavoritesStore {
    docs: RwLock<HashMap<UserId, Favorites>>,
}

impl MemoryFavoritesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a document, `None` if it does not exist.
    pub async fn document(&self, uid: &UserId) -> Option<Favorites> {
        self.docs.read().await.get(uid).cloned()
    }
}

#[async_trait]
impl FavoritesStore for MemoryFavoritesStore {
    async fn load_or_create(
        &self,
        uid: &UserId,
        _display_name: Option<&str>,
    ) -> Result<Favorites, FavoritesError> {
        let mut docs = self.docs.write().await;
        Ok(docs.entry(uid.clone()).or_default().clone())
    }

    async fn add(&self, uid: &UserId, code: &CountryCode) -> Result<(), FavoritesError> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .get_mut(uid)
            .ok_or_else(|| FavoritesError::Missing(uid.clone()))?;
        doc.insert(code.clone());
        Ok(())
    }

    async fn remove(&self, uid: &UserId, code: &CountryCode) -> Result<(), FavoritesError> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .get_mut(uid)
            .ok_or_else(|| FavoritesError::Missing(uid.clone()))?;
        doc.remove(code);
        Ok(())
    }

    async fn delete(&self, uid: &UserId) -> Result<(), FavoritesError> {
        self.docs.write().await.remove(uid);
        Ok(())
    }
}
