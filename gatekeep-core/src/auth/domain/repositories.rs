use async_trait::async_trait;
use thiserror::Error;

use super::model::{Credentials, Session, UserId};
use crate::auth::crypto::HashingError;

#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("username already registered")]
    DuplicateUsername,
    #[error("user not found")]
    NotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("credential storage unavailable: {0}")]
    Unavailable(#[from] anyhow::Error),
}

impl From<HashingError> for CredentialStoreError {
    fn from(err: HashingError) -> Self {
        CredentialStoreError::Hashing(err.to_string())
    }
}

/// Persists identities with a salted one-way hash of their secret.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Hash the secret and persist a new identity. The plaintext is never
    /// stored.
    async fn add_user(&self, credentials: &Credentials) -> Result<UserId, CredentialStoreError>;

    /// Check a presented secret against the stored hash and return the
    /// identity it belongs to.
    async fn auth_user(&self, credentials: &Credentials)
    -> Result<UserId, CredentialStoreError>;
}

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session expiration must be in the future")]
    InvalidExpiration,
    #[error("session storage unavailable: {0}")]
    Unavailable(#[from] anyhow::Error),
}

/// Token to identity associations that expire on their own.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist `session` until its expiry. Fails with
    /// [`SessionStoreError::InvalidExpiration`] (persisting nothing) when the
    /// expiry is not strictly after the current time.
    async fn add_session(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Owner of a live session, `None` once it expired or never existed.
    async fn lookup(&self, token: &str) -> Result<Option<UserId>, SessionStoreError>;

    async fn is_live(&self, token: &str) -> Result<bool, SessionStoreError> {
        Ok(self.lookup(token).await?.is_some())
    }
}
