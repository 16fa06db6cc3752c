//! The signed-in user and their favorites.
//!
//! A [`Session`] is an ordinary value: whoever needs the current user or
//! wants to mutate favorites is handed one explicitly.  Mutations write to
//! the favorites store first and only then touch local state, so a failed
//! write leaves the session exactly as it was.  Nothing is retried.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use explorer_shared::{CountryCode, Favorites, UserId};

use crate::favorites::{FavoritesError, FavoritesStore};
use crate::identity::{AuthUser, Credential, IdentityError, IdentityProvider};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Favorites(#[from] FavoritesError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedInUser {
    pub uid: UserId,
    pub display_name: Option<String>,
    pub favorites: Favorites,
}

pub struct Session {
    user: Option<SignedInUser>,
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn FavoritesStore>,
}

impl Session {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn FavoritesStore>) -> Self {
        Self {
            user: None,
            identity,
            store,
        }
    }

    pub fn user(&self) -> Option<&SignedInUser> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn favorites(&self) -> Option<&Favorites> {
        self.user.as_ref().map(|u| &u.favorites)
    }

    pub fn is_favorite(&self, code: &CountryCode) -> bool {
        self.favorites().map(|f| f.contains(code)).unwrap_or(false)
    }

    /// Sign in through the identity provider, then load (or create) the
    /// user's favorites document.
    pub async fn login(&mut self, credential: &Credential) -> Result<&SignedInUser, SessionError> {
        let auth = self.identity.sign_in(credential).await?;
        self.restore(auth).await
    }

    /// Adopt an identity that is already authenticated (the provider's
    /// auth-state callback) and load its favorites.
    pub async fn restore(&mut self, auth: AuthUser) -> Result<&SignedInUser, SessionError> {
        let favorites = self
            .store
            .load_or_create(&auth.uid, auth.display_name.as_deref())
            .await?;

        info!(
            uid = auth.uid.short(),
            favorites = favorites.len(),
            "session started"
        );

        Ok(self.user.insert(SignedInUser {
            uid: auth.uid,
            display_name: auth.display_name,
            favorites,
        }))
    }

    /// Sign out. Signing out while signed out is a no-op.
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        let Some(user) = self.user.as_ref() else {
            return Ok(());
        };

        self.identity.sign_out(&user.uid).await?;
        info!(uid = user.uid.short(), "session ended");
        self.user = None;
        Ok(())
    }

    /// Add `code` to the favorites.
    ///
    /// Returns `Ok(false)` without touching the store when signed out or
    /// when the code is already a favorite.
    pub async fn add_favorite(&mut self, code: &CountryCode) -> Result<bool, SessionError> {
        let Some(user) = self.user.as_mut() else {
            return Ok(false);
        };
        if user.favorites.contains(code) {
            return Ok(false);
        }

        self.store.add(&user.uid, code).await?;
        user.favorites.insert(code.clone());
        Ok(true)
    }

    /// Remove `code` from the favorites.
    ///
    /// Returns `Ok(false)` without touching the store when signed out.
    pub async fn remove_favorite(&mut self, code: &CountryCode) -> Result<bool, SessionError> {
        let Some(user) = self.user.as_mut() else {
            return Ok(false);
        };

        self.store.remove(&user.uid, code).await?;
        Ok(user.favorites.remove(code))
    }

    /// Permanently delete the account: re-authenticate, delete the favorites
    /// document, delete the identity, then clear local state.
    ///
    /// Any failure is returned and the local state is left unchanged.
    pub async fn delete_account(&mut self, credential: &Credential) -> Result<(), SessionError> {
        let uid = self
            .user
            .as_ref()
            .map(|u| u.uid.clone())
            .ok_or(SessionError::NotSignedIn)?;

        let result = self.delete_remote(&uid, credential).await;
        match &result {
            Ok(()) => {
                info!(uid = uid.short(), "account deleted");
                self.user = None;
            }
            Err(e) => warn!(uid = uid.short(), error = %e, "account deletion failed"),
        }
        result
    }

    async fn delete_remote(&self, uid: &UserId, credential: &Credential) -> Result<(), SessionError> {
        self.identity.reauthenticate(uid, credential).await?;
        self.store.delete(uid).await?;
        self.identity.delete_user(uid).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::favorites::MemoryFavoritesStore;
    use crate::identity::LocalIdentityProvider;

    fn code(s: &str) -> CountryCode {
        CountryCode::parse(s).unwrap()
    }

    fn session() -> (Session, Arc<LocalIdentityProvider>, Arc<MemoryFavoritesStore>) {
        let identity = Arc::new(LocalIdentityProvider::new());
        let store = Arc::new(MemoryFavoritesStore::new());
        let session = Session::new(identity.clone(), store.clone());
        (session, identity, store)
    }

    /// Store whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryFavoritesStore,
        down: AtomicBool,
    }

    impl FlakyStore {
        fn check(&self) -> Result<(), FavoritesError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(FavoritesError::Unavailable("offline".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl FavoritesStore for FlakyStore {
        async fn load_or_create(
            &self,
            uid: &UserId,
            display_name: Option<&str>,
        ) -> Result<Favorites, FavoritesError> {
            self.check()?;
            self.inner.load_or_create(uid, display_name).await
        }

        async fn add(&self, uid: &UserId, code: &CountryCode) -> Result<(), FavoritesError> {
            self.check()?;
            self.inner.add(uid, code).await
        }

        async fn remove(&self, uid: &UserId, code: &CountryCode) -> Result<(), FavoritesError> {
            self.check()?;
            self.inner.remove(uid, code).await
        }

        async fn delete(&self, uid: &UserId) -> Result<(), FavoritesError> {
            self.check()?;
            self.inner.delete(uid).await
        }
    }

    #[tokio::test]
    async fn login_creates_empty_document() {
        let (mut session, _, store) = session();
        let user = session
            .login(&Credential::new("uid-1").with_display_name("Ada"))
            .await
            .unwrap()
            .clone();

        assert_eq!(user.display_name.as_deref(), Some("Ada"));
        assert!(user.favorites.is_empty());
        assert_eq!(store.document(&user.uid).await, Some(Favorites::new()));
    }

    #[tokio::test]
    async fn signed_out_mutations_are_noops() {
        let (mut session, _, _) = session();
        assert!(!session.add_favorite(&code("FRA")).await.unwrap());
        assert!(!session.remove_favorite(&code("FRA")).await.unwrap());
        assert!(!session.is_favorite(&code("FRA")));
        session.logout().await.unwrap();
    }

    #[tokio::test]
    async fn add_then_remove_restores_favorites() {
        let (mut session, _, store) = session();
        session.login(&Credential::new("uid-1")).await.unwrap();
        session.add_favorite(&code("USA")).await.unwrap();
        let before = session.favorites().cloned().unwrap();

        assert!(session.add_favorite(&code("FRA")).await.unwrap());
        assert!(!session.add_favorite(&code("FRA")).await.unwrap());
        assert!(session.is_favorite(&code("FRA")));

        assert!(session.remove_favorite(&code("FRA")).await.unwrap());
        assert_eq!(session.favorites(), Some(&before));

        let uid = session.user().unwrap().uid.clone();
        assert_eq!(store.document(&uid).await, Some(before));
    }

    #[tokio::test]
    async fn favorites_survive_relogin() {
        let (mut session, _, _) = session();
        session.login(&Credential::new("uid-1")).await.unwrap();
        session.add_favorite(&code("JPN")).await.unwrap();
        session.logout().await.unwrap();
        assert!(!session.is_signed_in());

        let user = session.login(&Credential::new("uid-1")).await.unwrap();
        assert!(user.favorites.contains(&code("JPN")));
    }

    #[tokio::test]
    async fn failed_write_leaves_local_state() {
        let identity = Arc::new(LocalIdentityProvider::new());
        let store = Arc::new(FlakyStore::default());
        let mut session = Session::new(identity, store.clone());
        session.login(&Credential::new("uid-1")).await.unwrap();
        session.add_favorite(&code("FRA")).await.unwrap();

        store.down.store(true, Ordering::SeqCst);
        assert!(session.add_favorite(&code("DEU")).await.is_err());
        assert!(session.remove_favorite(&code("FRA")).await.is_err());

        assert!(session.is_favorite(&code("FRA")));
        assert!(!session.is_favorite(&code("DEU")));
    }

    #[tokio::test]
    async fn delete_account_clears_everything() {
        let (mut session, identity, store) = session();
        session.login(&Credential::new("uid-1")).await.unwrap();
        session.add_favorite(&code("FRA")).await.unwrap();
        let uid = session.user().unwrap().uid.clone();

        session
            .delete_account(&Credential::new("uid-1"))
            .await
            .unwrap();

        assert!(!session.is_signed_in());
        assert!(store.document(&uid).await.is_none());
        assert_eq!(identity.account_count().await, 0);
    }

    #[tokio::test]
    async fn delete_account_failure_keeps_state() {
        let (mut session, identity, store) = session();
        session.login(&Credential::new("uid-1")).await.unwrap();
        session.add_favorite(&code("FRA")).await.unwrap();
        let uid = session.user().unwrap().uid.clone();

        let err = session
            .delete_account(&Credential::new("someone-else"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Identity(IdentityError::Mismatch)));

        assert!(session.is_favorite(&code("FRA")));
        assert!(store.document(&uid).await.is_some());
        assert_eq!(identity.account_count().await, 1);
    }

    #[tokio::test]
    async fn delete_account_requires_sign_in() {
        let (mut session, _, _) = session();
        assert!(matches!(
            session.delete_account(&Credential::new("uid-1")).await,
            Err(SessionError::NotSignedIn)
        ));
    }
}
