//! Identity provider seam.
//!
//! The real provider (Google sign-in) lives outside this codebase; the app
//! only needs the four calls of [`IdentityProvider`].  [`LocalIdentityProvider`]
//! is an in-process account registry for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use explorer_shared::UserId;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Credential belongs to a different account")]
    Mismatch,

    #[error("Unknown account: {0}")]
    UnknownUser(UserId),

    #[error("Identity provider error: {0}")]
    Provider(String),
}

/// What the sign-in flow hands back to the app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id_token: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Credential {
    pub fn new(id_token: impl Into<String>) -> Self {
        Self {
            id_token: id_token.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: UserId,
    pub display_name: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, credential: &Credential) -> Result<AuthUser, IdentityError>;

    async fn sign_out(&self, uid: &UserId) -> Result<(), IdentityError>;

    /// Prove again that the caller controls `uid`, e.g. before destructive
    /// account operations.
    async fn reauthenticate(
        &self,
        uid: &UserId,
        credential: &Credential,
    ) -> Result<AuthUser, IdentityError>;

    /// Delete the identity record itself.
    async fn delete_user(&self, uid: &UserId) -> Result<(), IdentityError>;
}

#[derive(Debug, Clone)]
struct Account {
    display_name: Option<String>,
    signed_in: bool,
}

/// Accounts kept in memory. The token subject is the UID: the id token is
/// trusted as-is, so this must never face untrusted callers without a
/// verifying proxy in front.
#[derive(Debug, Default)]
pub struct LocalIdentityProvider {
    accounts: RwLock<HashMap<UserId, Account>>,
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn subject(credential: &Credential) -> Result<UserId, IdentityError> {
        UserId::new(credential.id_token.trim()).map_err(|_| IdentityError::InvalidCredential)
    }

    pub async fn is_signed_in(&self, uid: &UserId) -> bool {
        let accounts = self.accounts.read().await;
        accounts.get(uid).map(|a| a.signed_in).unwrap_or(false)
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in(&self, credential: &Credential) -> Result<AuthUser, IdentityError> {
        let uid = Self::subject(credential)?;

        let mut accounts = self.accounts.write().await;
        let account = accounts.entry(uid.clone()).or_insert_with(|| {
            info!(uid = uid.short(), "registering new account");
            Account {
                display_name: None,
                signed_in: false,
            }
        });
        if credential.display_name.is_some() {
            account.display_name = credential.display_name.clone();
        }
        account.signed_in = true;

        debug!(uid = uid.short(), "signed in");
        Ok(AuthUser {
            uid,
            display_name: account.display_name.clone(),
        })
    }

    async fn sign_out(&self, uid: &UserId) -> Result<(), IdentityError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(uid)
            .ok_or_else(|| IdentityError::UnknownUser(uid.clone()))?;
        account.signed_in = false;

        debug!(uid = uid.short(), "signed out");
        Ok(())
    }

    async fn reauthenticate(
        &self,
        uid: &UserId,
        credential: &Credential,
    ) -> Result<AuthUser, IdentityError> {
        let subject = Self::subject(credential)?;
        if &subject != uid {
            return Err(IdentityError::Mismatch);
        }

        let accounts = self.accounts.read().await;
        let account = accounts
            .get(uid)
            .ok_or_else(|| IdentityError::UnknownUser(uid.clone()))?;

        Ok(AuthUser {
            uid: subject,
            display_name: account.display_name.clone(),
        })
    }

    async fn delete_user(&self, uid: &UserId) -> Result<(), IdentityError> {
        let mut accounts = self.accounts.write().await;
        accounts
            .remove(uid)
            .ok_or_else(|| IdentityError::UnknownUser(uid.clone()))?;

        info!(uid = uid.short(), "account deleted");
        Ok(())
    }
}
