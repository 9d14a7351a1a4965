use std::fmt;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::domain::model::{Session, UserId};
use crate::auth::domain::repositories::{SessionStore, SessionStoreError};

/// Session store keyed by token string with the owner's id as value. Expiry
/// is Redis's own key TTL.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisSessionStore")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisSessionStore {
    /// Connect and confirm the server answers `PING`.
    pub async fn connect(redis_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to Redis session store");

        let client = redis::Client::open(redis_url)
            .map_err(|e| anyhow!("failed to create Redis client: {e}"))?;
        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|e| anyhow!("failed to connect to Redis: {e}"))?;

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| anyhow!("Redis PING failed: {e}"))?;

        info!("Successfully connected to Redis session store");
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

fn unavailable(context: &'static str, err: redis::RedisError) -> SessionStoreError {
    SessionStoreError::Unavailable(anyhow!(err).context(context))
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn add_session(&self, session: &Session) -> Result<(), SessionStoreError> {
        let ttl = session
            .ttl_at(Utc::now())
            .ok_or(SessionStoreError::InvalidExpiration)?;
        // PSETEX rejects zero, and anything under a millisecond is effectively
        // already expired.
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        if ttl_ms == 0 {
            return Err(SessionStoreError::InvalidExpiration);
        }

        debug!(user_id = %session.user_id, ttl_ms, "storing session");

        let mut conn = self.conn.clone();
        conn.pset_ex::<_, _, ()>(&session.token, session.user_id.to_string(), ttl_ms)
            .await
            .map_err(|e| unavailable("Redis PSETEX failed", e))
    }

    async fn lookup(&self, token: &str) -> Result<Option<UserId>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(token)
            .await
            .map_err(|e| unavailable("Redis GET failed", e))?;

        value
            .map(|raw| {
                Uuid::parse_str(&raw)
                    .map(UserId::from_uuid)
                    .map_err(|e| {
                        SessionStoreError::Unavailable(anyhow!(
                            "corrupt session value in Redis: {e}"
                        ))
                    })
            })
            .transpose()
    }

    async fn is_live(&self, token: &str) -> Result<bool, SessionStoreError> {
        let mut conn = self.conn.clone();
        conn.exists(token)
            .await
            .map_err(|e| unavailable("Redis EXISTS failed", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
    }

    async fn connection() -> ConnectionManager {
        let client = redis::Client::open(redis_url()).unwrap();
        ConnectionManager::new(client).await.unwrap()
    }

    /// Tokens are random so parallel tests never share keys.
    fn fresh_token() -> String {
        format!("gatekeep-test-{}", Uuid::new_v4())
    }

    async fn pttl(conn: &mut ConnectionManager, token: &str) -> i64 {
        redis::cmd("PTTL")
            .arg(token)
            .query_async(conn)
            .await
            .unwrap()
    }

    #[tokio::test]
    #[ignore = "requires REDIS_URL"]
    async fn stores_owner_with_matching_ttl() {
        let mut conn = connection().await;
        let store = RedisSessionStore::connect(&redis_url()).await.unwrap();
        let user = UserId::generate();
        let token = fresh_token();

        let expires_at = Utc::now() + Duration::seconds(60);
        store
            .add_session(&Session::new(token.clone(), user, expires_at))
            .await
            .unwrap();

        assert_eq!(store.lookup(&token).await.unwrap(), Some(user));
        assert!(store.is_live(&token).await.unwrap());

        let remaining = pttl(&mut conn, &token).await;
        let expected = (expires_at - Utc::now()).num_milliseconds();
        assert!(remaining > 0 && remaining <= 60_000, "PTTL {remaining}");
        assert!((expected - remaining).abs() < 1_000, "PTTL {remaining} vs {expected}");
    }

    #[tokio::test]
    #[ignore = "requires REDIS_URL"]
    async fn past_or_immediate_expiry_is_refused() {
        let store = RedisSessionStore::connect(&redis_url()).await.unwrap();
        let user = UserId::generate();

        let past = Session::new(fresh_token(), user, Utc::now() - Duration::seconds(1));
        assert!(matches!(
            store.add_session(&past).await,
            Err(SessionStoreError::InvalidExpiration)
        ));

        let token = fresh_token();
        let sub_millisecond =
            Session::new(token.clone(), user, Utc::now() + Duration::microseconds(500));
        assert!(matches!(
            store.add_session(&sub_millisecond).await,
            Err(SessionStoreError::InvalidExpiration)
        ));
        assert!(!store.is_live(&token).await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires REDIS_URL"]
    async fn session_disappears_after_expiry() {
        let store = RedisSessionStore::connect(&redis_url()).await.unwrap();
        let user = UserId::generate();
        let token = fresh_token();

        store
            .add_session(&Session::new(
                token.clone(),
                user,
                Utc::now() + Duration::milliseconds(1_100),
            ))
            .await
            .unwrap();
        assert_eq!(store.lookup(&token).await.unwrap(), Some(user));

        tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;

        assert_eq!(store.lookup(&token).await.unwrap(), None);
        assert!(!store.is_live(&token).await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires REDIS_URL"]
    async fn unknown_token_is_not_live() {
        let store = RedisSessionStore::connect(&redis_url()).await.unwrap();
        let token = fresh_token();

        assert_eq!(store.lookup(&token).await.unwrap(), None);
        assert!(!store.is_live(&token).await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires REDIS_URL"]
    async fn corrupt_value_is_a_store_error() {
        let mut conn = connection().await;
        let token = fresh_token();
        conn.pset_ex::<_, _, ()>(&token, "not-a-user-id", 60_000)
            .await
            .unwrap();

        let store = RedisSessionStore::from_connection(conn);
        assert!(matches!(
            store.lookup(&token).await,
            Err(SessionStoreError::Unavailable(_))
        ));
        assert!(store.is_live(&token).await.unwrap());
    }
}
