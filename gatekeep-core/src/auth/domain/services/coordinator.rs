use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use tracing::{debug, info, warn};

use crate::auth::domain::model::{Credentials, Session, UserId};
use crate::auth::domain::repositories::{
    CredentialStore, CredentialStoreError, SessionStore, SessionStoreError,
};
use crate::auth::token::{TokenError, TokenIssuer};

/// Lifetime of a login session and the token that represents it, in seconds.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 15 * 60;

/// Longest accepted session lifetime, in seconds.
pub const MAX_SESSION_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Caller-facing outcome of the register/login protocol.
///
/// Unknown users and wrong passwords both surface as
/// [`AuthError::Unauthorized`] so responses cannot be used to probe which
/// usernames exist.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("username already taken")]
    UsernameTaken,
    #[error("unauthorized")]
    Unauthorized,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("token signing error: {0}")]
    Signing(String),
}

impl From<CredentialStoreError> for AuthError {
    fn from(err: CredentialStoreError) -> Self {
        match err {
            CredentialStoreError::DuplicateUsername => AuthError::UsernameTaken,
            CredentialStoreError::NotFound | CredentialStoreError::InvalidCredentials => {
                AuthError::Unauthorized
            }
            CredentialStoreError::Hashing(msg) => AuthError::Storage(msg),
            CredentialStoreError::Unavailable(err) => AuthError::Storage(format!("{err:#}")),
        }
    }
}

impl From<SessionStoreError> for AuthError {
    fn from(err: SessionStoreError) -> Self {
        AuthError::Storage(err.to_string())
    }
}

/// A token whose session record is persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A verified token that still has a live session behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedSession {
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

/// Runs the register and login flows against swappable stores.
///
/// Holds no per-request state; one instance is shared by every handler.
pub struct AuthCoordinator {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    issuer: Arc<TokenIssuer>,
    session_ttl: Duration,
}

impl fmt::Debug for AuthCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCoordinator")
            .field("credentials_refs", &Arc::strong_count(&self.credentials))
            .field("sessions_refs", &Arc::strong_count(&self.sessions))
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}

impl AuthCoordinator {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            credentials,
            sessions,
            issuer,
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }

    /// Override the session lifetime. Values under one second are raised to
    /// one second since expiries are tracked in whole seconds; values over
    /// [`MAX_SESSION_TTL_SECS`] are lowered to it.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl.clamp(
            Duration::seconds(1),
            Duration::seconds(MAX_SESSION_TTL_SECS),
        );
        self
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub async fn register(&self, credentials: Credentials) -> Result<UserId, AuthError> {
        validate(&credentials)?;

        match self.credentials.add_user(&credentials).await {
            Ok(user_id) => {
                info!(user_id = %user_id, "user registered");
                Ok(user_id)
            }
            Err(err) => {
                warn!(error = %err, "registration failed");
                Err(err.into())
            }
        }
    }

    /// Verify credentials, then mint a token and persist its session with the
    /// same expiry. A session write failure discards the already-signed token;
    /// it is never handed out without its session.
    pub async fn login(&self, credentials: Credentials) -> Result<IssuedToken, AuthError> {
        validate(&credentials)?;

        let user_id = match self.credentials.auth_user(&credentials).await {
            Ok(user_id) => user_id,
            Err(err) => {
                debug!(error = %err, "login rejected");
                return Err(err.into());
            }
        };

        let expires_at = self.expiry_from(Utc::now())?;

        let token = self.issuer.issue(user_id, expires_at).map_err(|err| {
            warn!(user_id = %user_id, error = %err, "token signing failed");
            AuthError::Signing(err.to_string())
        })?;

        let session = Session::new(token, user_id, expires_at);
        if let Err(err) = self.sessions.add_session(&session).await {
            warn!(
                user_id = %user_id,
                error = %err,
                "session persistence failed; discarding issued token"
            );
            return Err(err.into());
        }

        info!(user_id = %user_id, expires_at = %expires_at, "session established");

        Ok(IssuedToken {
            token: session.token,
            user_id,
            expires_at,
        })
    }

    /// Check a presented token: signature and expiry first, then that its
    /// session is still live and owned by the token's subject.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedSession, AuthError> {
        let claims = self.issuer.verify(token).map_err(|err| {
            debug!(error = %err, "token rejected");
            match err {
                TokenError::Expired | TokenError::Invalid(_) => AuthError::Unauthorized,
                other => AuthError::Signing(other.to_string()),
            }
        })?;

        let owner = self.sessions.lookup(token).await?;
        if owner != Some(claims.sub) {
            debug!(user_id = %claims.sub, "token has no live session");
            return Err(AuthError::Unauthorized);
        }

        let expires_at = claims.expires_at().ok_or(AuthError::Unauthorized)?;
        Ok(AuthenticatedSession {
            user_id: claims.sub,
            expires_at,
        })
    }

    /// Computed once per login and shared by the token and the session.
    /// Whole seconds, since that is what the token's `exp` claim can carry.
    fn expiry_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, AuthError> {
        now.checked_add_signed(self.session_ttl)
            .map(|expiry| expiry.trunc_subsecs(0))
            .ok_or_else(|| AuthError::Signing("session expiry out of range".into()))
    }
}

fn validate(credentials: &Credentials) -> Result<(), AuthError> {
    if credentials.username().trim().is_empty() {
        return Err(AuthError::InvalidInput("username must not be empty".into()));
    }
    if credentials.password().is_empty() {
        return Err(AuthError::InvalidInput("password must not be empty".into()));
    }
    Ok(())
}
