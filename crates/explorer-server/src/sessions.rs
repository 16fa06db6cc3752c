//! Bearer-token sessions.
//!
//! Each successful `POST /api/login` creates a [`Session`] and hands back a
//! random v4 UUID. Requests carry it as `Authorization: Bearer <uuid>`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use explorer_client::{
    Credential, FavoritesStore, IdentityProvider, Session, SessionError, SignedInUser,
};
use explorer_shared::{Favorites, UserId};

use crate::api::AppState;
use crate::error::ServerError;

pub type SessionHandle = Arc<Mutex<Session>>;

struct Entry {
    uid: UserId,
    session: SessionHandle,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct SessionRegistry {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn FavoritesStore>,
    entries: Arc<RwLock<HashMap<Uuid, Entry>>>,
}

impl SessionRegistry {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn FavoritesStore>) -> Self {
        Self {
            identity,
            store,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Sign in and register a fresh session under a new token.
    pub async fn login(&self, credential: &Credential) -> Result<(Uuid, SignedInUser), SessionError> {
        let mut session = Session::new(self.identity.clone(), self.store.clone());
        let user = session.login(credential).await?.clone();

        let token = Uuid::new_v4();
        let mut entries = self.entries.write().await;
        entries.insert(
            token,
            Entry {
                uid: user.uid.clone(),
                session: Arc::new(Mutex::new(session)),
                last_seen: Instant::now(),
            },
        );

        info!(uid = user.uid.short(), active = entries.len(), "Session registered");
        Ok((token, user))
    }

    /// Look up a session and mark it as used.
    pub async fn get(&self, token: &Uuid) -> Option<SessionHandle> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(token)?;
        entry.last_seen = Instant::now();
        Some(entry.session.clone())
    }

    pub async fn remove(&self, token: &Uuid) -> bool {
        self.entries.write().await.remove(token).is_some()
    }

    /// Drop every session signed in as `uid`, e.g. once the account is gone.
    pub async fn remove_user(&self, uid: &UserId) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| &entry.uid != uid);
        let removed = before - entries.len();
        info!(uid = uid.short(), removed, "Sessions closed for user");
        removed
    }

    /// Drop sessions idle for longer than `max_idle`.
    pub async fn purge_idle(&self, max_idle: Duration) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.last_seen.elapsed() < max_idle);
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, remaining = entries.len(), "Idle sessions purged");
        }
        purged
    }
}

/// Extract the session token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth.strip_prefix("Bearer ")?;
    Uuid::parse_str(token.trim()).ok()
}

/// The caller's session; rejects with 401 when absent.
pub struct CurrentSession {
    pub token: Uuid,
    pub session: SessionHandle,
}

impl CurrentSession {
    pub async fn user(&self) -> Option<SignedInUser> {
        self.session.lock().await.user().cloned()
    }
}

/// The caller's session if they sent a valid token.
pub struct MaybeSession(pub Option<CurrentSession>);

impl MaybeSession {
    pub async fn favorites(&self) -> Option<Favorites> {
        match &self.0 {
            Some(current) => current.session.lock().await.favorites().cloned(),
            None => None,
        }
    }

    pub async fn user(&self) -> Option<SignedInUser> {
        match &self.0 {
            Some(current) => current.user().await,
            None => None,
        }
    }
}

async fn lookup(parts: &Parts, state: &AppState) -> Option<CurrentSession> {
    let token = bearer_token(&parts.headers)?;
    let session = state.sessions.get(&token).await?;
    Some(CurrentSession { token, session })
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        lookup(parts, state).await.ok_or(ServerError::Unauthorized)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(lookup(parts, state).await))
    }
}
