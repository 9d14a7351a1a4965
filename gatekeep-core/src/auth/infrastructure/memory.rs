//! Process-local engines for tests and development runs.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};

use crate::auth::crypto::PasswordHasher;
use crate::auth::domain::model::{Credentials, Session, UserId};
use crate::auth::domain::repositories::{
    CredentialStore, CredentialStoreError, SessionStore, SessionStoreError,
};

#[derive(Debug, Clone)]
struct StoredUser {
    user_id: UserId,
    password_hash: String,
}

/// Credential store keyed by username.
pub struct InMemoryCredentialStore {
    hasher: Arc<PasswordHasher>,
    users: DashMap<String, StoredUser>,
}

impl fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryCredentialStore")
            .field("users", &self.users.len())
            .finish()
    }
}

impl InMemoryCredentialStore {
    pub fn new(hasher: Arc<PasswordHasher>) -> Self {
        Self {
            hasher,
            users: DashMap::new(),
        }
    }

    /// Stored PHC string for `username`, for inspection in tests.
    pub fn stored_hash(&self, username: &str) -> Option<String> {
        self.users
            .get(username)
            .map(|user| user.password_hash.clone())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn add_user(&self, credentials: &Credentials) -> Result<UserId, CredentialStoreError> {
        if self.users.contains_key(credentials.username()) {
            return Err(CredentialStoreError::DuplicateUsername);
        }

        let password_hash = self
            .hasher
            .hash_blocking(credentials.password_owned())
            .await?;

        // Re-check under the shard lock: another request may have claimed the
        // name while we were hashing.
        match self.users.entry(credentials.username().to_string()) {
            Entry::Occupied(_) => Err(CredentialStoreError::DuplicateUsername),
            Entry::Vacant(slot) => {
                let user_id = UserId::generate();
                slot.insert(StoredUser {
                    user_id,
                    password_hash,
                });
                Ok(user_id)
            }
        }
    }

    async fn auth_user(
        &self,
        credentials: &Credentials,
    ) -> Result<UserId, CredentialStoreError> {
        let stored = self
            .users
            .get(credentials.username())
            .map(|user| user.value().clone());

        let verified = self
            .hasher
            .verify_blocking(
                credentials.password_owned(),
                stored.as_ref().map(|user| user.password_hash.clone()),
            )
            .await?;

        match (stored, verified) {
            (None, _) => Err(CredentialStoreError::NotFound),
            (Some(_), false) => Err(CredentialStoreError::InvalidCredentials),
            (Some(user), true) => Ok(user.user_id),
        }
    }
}

/// Session store that honours expiry on every read.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, (UserId, DateTime<Utc>)>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, (_, expires_at)| *expires_at > now);
        before.saturating_sub(self.sessions.len())
    }

    /// Expiry recorded for `token`, ignoring whether it has passed.
    pub fn expiry_of(&self, token: &str) -> Option<DateTime<Utc>> {
        self.sessions.get(token).map(|entry| entry.value().1)
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn add_session(&self, session: &Session) -> Result<(), SessionStoreError> {
        if session.ttl_at(Utc::now()).is_none() {
            return Err(SessionStoreError::InvalidExpiration);
        }

        self.sessions.insert(
            session.token.clone(),
            (session.user_id, session.expires_at),
        );
        Ok(())
    }

    async fn lookup(&self, token: &str) -> Result<Option<UserId>, SessionStoreError> {
        let now = Utc::now();
        let live = self
            .sessions
            .get(token)
            .map(|entry| *entry.value())
            .and_then(|(user_id, expires_at)| (expires_at > now).then_some(user_id));

        if live.is_none() {
            self.sessions
                .remove_if(token, |_, (_, expires_at)| *expires_at <= now);
        }

        Ok(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::crypto::HashingCost;
    use chrono::Duration;

    fn credential_store() -> InMemoryCredentialStore {
        let hasher = PasswordHasher::new(HashingCost::minimal()).unwrap();
        InMemoryCredentialStore::new(Arc::new(hasher))
    }

    #[tokio::test]
    async fn registers_and_authenticates() {
        let store = credential_store();
        let id = store
            .add_user(&Credentials::new("alice", "secret123"))
            .await
            .unwrap();

        let again = store
            .auth_user(&Credentials::new("alice", "secret123"))
            .await
            .unwrap();
        assert_eq!(id, again);
    }

    #[tokio::test]
    async fn distinguishes_unknown_user_from_wrong_password() {
        let store = credential_store();
        store
            .add_user(&Credentials::new("alice", "secret123"))
            .await
            .unwrap();

        assert!(matches!(
            store.auth_user(&Credentials::new("alice", "wrong")).await,
            Err(CredentialStoreError::InvalidCredentials)
        ));
        assert!(matches!(
            store.auth_user(&Credentials::new("nobody", "secret123")).await,
            Err(CredentialStoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = credential_store();
        store
            .add_user(&Credentials::new("alice", "one"))
            .await
            .unwrap();

        assert!(matches!(
            store.add_user(&Credentials::new("alice", "two")).await,
            Err(CredentialStoreError::DuplicateUsername)
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_duplicate_registration_admits_one() {
        let store = Arc::new(credential_store());
        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .add_user(&Credentials::new("carol", format!("pw{i}")))
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn stored_hash_is_salted_and_not_plaintext() {
        let store = credential_store();
        store
            .add_user(&Credentials::new("alice", "secret123"))
            .await
            .unwrap();
        store
            .add_user(&Credentials::new("bob", "secret123"))
            .await
            .unwrap();

        let alice = store.stored_hash("alice").unwrap();
        let bob = store.stored_hash("bob").unwrap();
        assert!(!alice.contains("secret123"));
        assert_ne!(alice, bob);
    }

    #[tokio::test]
    async fn rejects_non_future_expiry() {
        let store = InMemorySessionStore::new();
        let user = UserId::generate();

        let past = Session::new("past", user, Utc::now() - Duration::seconds(5));
        assert!(matches!(
            store.add_session(&past).await,
            Err(SessionStoreError::InvalidExpiration)
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn session_lives_until_expiry() {
        let store = InMemorySessionStore::new();
        let user = UserId::generate();
        let session = Session::new(
            "short",
            user,
            Utc::now() + Duration::milliseconds(300),
        );
        store.add_session(&session).await.unwrap();

        assert_eq!(store.lookup("short").await.unwrap(), Some(user));
        assert!(store.is_live("short").await.unwrap());

        tokio::time::sleep(std::time::Duration::from_millis(450)).await;

        assert_eq!(store.lookup("short").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn purge_drops_only_expired_entries() {
        let store = InMemorySessionStore::new();
        let user = UserId::generate();
        store
            .add_session(&Session::new(
                "soon",
                user,
                Utc::now() + Duration::milliseconds(100),
            ))
            .await
            .unwrap();
        store
            .add_session(&Session::new(
                "later",
                user,
                Utc::now() + Duration::minutes(10),
            ))
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_live("later").await.unwrap());
    }
}
