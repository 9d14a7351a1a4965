use std::{sync::Arc, time::Duration};

use anyhow::Context;
use gatekeep_config::Config;
use gatekeep_core::{
    AuthCoordinator, MIGRATOR,
    auth::{
        PasswordHasher, TokenIssuer,
        domain::{CredentialStore, SessionStore},
        infrastructure::{
            InMemoryCredentialStore, InMemorySessionStore, PostgresCredentialStore,
            RedisSessionStore,
        },
    },
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{debug, info, warn};

use crate::infra::app_state::AppState;

/// How often the in-memory session store drops expired entries.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Which engines back the credential and session stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL credentials and Redis sessions.
    Persistent,
    /// Process-local maps. Everything is lost on exit.
    InMemory,
}

/// Wire stores, hasher, and token issuer into the shared application state.
pub async fn build_app_state(config: Arc<Config>, backend: StoreBackend) -> anyhow::Result<AppState> {
    let hasher = Arc::new(
        PasswordHasher::new(config.auth.hashing.into())
            .context("invalid Argon2 cost parameters")?,
    );
    let cost = hasher.cost();
    debug!(
        memory_kib = cost.memory_kib,
        iterations = cost.iterations,
        parallelism = cost.parallelism,
        "password hasher ready"
    );
    let issuer = Arc::new(
        TokenIssuer::new(config.auth.token_key.as_bytes())
            .context("failed to initialise token issuer")?,
    );

    let (credentials, sessions): (Arc<dyn CredentialStore>, Arc<dyn SessionStore>) = match backend
    {
        StoreBackend::Persistent => {
            let pool = connect_postgres(&config).await?;
            run_migrations(&pool).await?;

            let redis_url = config.require_redis_url()?;
            let sessions = RedisSessionStore::connect(redis_url)
                .await
                .context("failed to connect to Redis")?;
            info!("Redis session store connected");

            (
                Arc::new(PostgresCredentialStore::new(pool, hasher)) as Arc<dyn CredentialStore>,
                Arc::new(sessions) as Arc<dyn SessionStore>,
            )
        }
        StoreBackend::InMemory => {
            warn!("using in-memory stores; identities and sessions are lost on exit");
            let sessions = Arc::new(InMemorySessionStore::new());
            spawn_session_sweeper(Arc::clone(&sessions));

            (
                Arc::new(InMemoryCredentialStore::new(hasher)) as Arc<dyn CredentialStore>,
                sessions as Arc<dyn SessionStore>,
            )
        }
    };

    let session_ttl = chrono::Duration::from_std(config.auth.session_ttl)
        .context("session lifetime out of range")?;
    let coordinator =
        AuthCoordinator::new(credentials, sessions, issuer).with_session_ttl(session_ttl);

    Ok(AppState::new(coordinator, config))
}

pub async fn connect_postgres(config: &Config) -> anyhow::Result<PgPool> {
    let url = config.require_database_url()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout)
        .test_before_acquire(true)
        .connect(url)
        .await
        .context("failed to connect to PostgreSQL")?;

    info!(
        max_connections = config.database.max_connections,
        "PostgreSQL pool ready"
    );
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("database migration failed")?;
    info!("database migrations applied");
    Ok(())
}

fn spawn_session_sweeper(sessions: Arc<InMemorySessionStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired();
            if purged > 0 {
                debug!(purged, "expired sessions removed");
            }
        }
    });
}
