use std::{fmt, sync::Arc};

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::auth::crypto::PasswordHasher;
use crate::auth::domain::model::{Credentials, UserId};
use crate::auth::domain::repositories::{CredentialStore, CredentialStoreError};

/// Credential store backed by the `users` table.
pub struct PostgresCredentialStore {
    pool: PgPool,
    hasher: Arc<PasswordHasher>,
}

impl fmt::Debug for PostgresCredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresCredentialStore")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool, hasher: Arc<PasswordHasher>) -> Self {
        Self { pool, hasher }
    }
}

fn unavailable(err: sqlx::Error) -> CredentialStoreError {
    CredentialStoreError::Unavailable(anyhow!(err).context("credential query failed"))
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn add_user(&self, credentials: &Credentials) -> Result<UserId, CredentialStoreError> {
        let hashed_password = self
            .hasher
            .hash_blocking(credentials.password_owned())
            .await?;
        let user_id = UserId::generate();

        let result = sqlx::query(
            r#"
            INSERT INTO users (user_id, username, hashed_password)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(credentials.username())
        .bind(&hashed_password)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(user_id = %user_id, "user row inserted");
                Ok(user_id)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(CredentialStoreError::DuplicateUsername)
            }
            Err(err) => Err(unavailable(err)),
        }
    }

    async fn auth_user(
        &self,
        credentials: &Credentials,
    ) -> Result<UserId, CredentialStoreError> {
        let row: Option<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT user_id, hashed_password
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(credentials.username())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        let (user_id, stored_hash) = match row {
            Some((id, hash)) => (Some(UserId::from_uuid(id)), Some(hash)),
            None => (None, None),
        };

        let verified = self
            .hasher
            .verify_blocking(credentials.password_owned(), stored_hash)
            .await?;

        match (user_id, verified) {
            (None, _) => Err(CredentialStoreError::NotFound),
            (Some(_), false) => Err(CredentialStoreError::InvalidCredentials),
            (Some(id), true) => Ok(id),
        }
    }
}
