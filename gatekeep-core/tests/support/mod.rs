use std::sync::Arc;

use gatekeep_core::AuthCoordinator;
use gatekeep_core::auth::infrastructure::{InMemoryCredentialStore, InMemorySessionStore};
use gatekeep_core::auth::{HashingCost, PasswordHasher, TokenIssuer};

pub const TEST_SIGNING_KEY: &str = "integration-test-signing-key";

/// Coordinator wired to in-memory engines, with handles kept for inspection.
pub struct TestAuthHarness {
    pub credentials: Arc<InMemoryCredentialStore>,
    pub sessions: Arc<InMemorySessionStore>,
    pub issuer: Arc<TokenIssuer>,
    pub coordinator: AuthCoordinator,
}

impl TestAuthHarness {
    pub fn new() -> Self {
        let hasher = Arc::new(
            PasswordHasher::new(HashingCost::minimal()).expect("minimal Argon2 params are valid"),
        );
        let credentials = Arc::new(InMemoryCredentialStore::new(hasher));
        let sessions = Arc::new(InMemorySessionStore::new());
        let issuer = Arc::new(TokenIssuer::new(TEST_SIGNING_KEY).expect("non-empty key"));

        let coordinator = AuthCoordinator::new(
            credentials.clone(),
            sessions.clone(),
            issuer.clone(),
        );

        Self {
            credentials,
            sessions,
            issuer,
            coordinator,
        }
    }

    pub fn with_session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.coordinator = self.coordinator.with_session_ttl(ttl);
        self
    }
}
