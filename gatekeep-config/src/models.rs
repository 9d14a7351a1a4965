use std::path::PathBuf;
use std::time::Duration;

use gatekeep_core::auth::HashingCost;

use crate::constants::{
    DEFAULT_ARGON2_ITERATIONS, DEFAULT_ARGON2_MEMORY_KIB, DEFAULT_ARGON2_PARALLELISM,
    DEFAULT_DB_ACQUIRE_TIMEOUT, DEFAULT_DB_MAX_CONNECTIONS, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_SESSION_TTL, DEFAULT_TOKEN_KEY,
};
use crate::loader::ConfigLoadError;

/// Fully resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub auth: AuthConfig,
    /// Relaxes guard rails that would otherwise refuse to start.
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

impl Config {
    /// Postgres URL, required unless running on in-memory stores.
    pub fn require_database_url(&self) -> Result<&str, ConfigLoadError> {
        self.database
            .url
            .as_deref()
            .ok_or(ConfigLoadError::MissingValue {
                name: "DATABASE_URL",
            })
    }

    /// Redis URL, required unless running on in-memory stores.
    pub fn require_redis_url(&self) -> Result<&str, ConfigLoadError> {
        self.redis
            .as_ref()
            .map(|redis| redis.url.as_str())
            .ok_or(ConfigLoadError::MissingValue { name: "REDIS_URL" })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection URL. Optional so in-memory runs need no database.
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_DB_ACQUIRE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub token_key: String,
    pub session_ttl: Duration,
    pub hashing: HashingConfig,
}

impl AuthConfig {
    pub fn is_default_token_key(&self) -> bool {
        self.token_key == DEFAULT_TOKEN_KEY
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_key", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .field("hashing", &self.hashing)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            session_ttl: DEFAULT_SESSION_TTL,
            hashing: HashingConfig::default(),
        }
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_ARGON2_MEMORY_KIB,
            iterations: DEFAULT_ARGON2_ITERATIONS,
            parallelism: DEFAULT_ARGON2_PARALLELISM,
        }
    }
}

impl From<HashingConfig> for HashingCost {
    fn from(config: HashingConfig) -> Self {
        Self {
            memory_kib: config.memory_kib,
            iterations: config.iterations,
            parallelism: config.parallelism,
        }
    }
}

/// Where the configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
