use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use thiserror::Error;
use url::Url;

use crate::constants::{DEFAULT_CONFIG_LOCATIONS, MAX_SESSION_TTL};
use crate::models::{
    AuthConfig, Config, ConfigMetadata, DatabaseConfig, HashingConfig, RedisConfig, ServerConfig,
};
use crate::sources::{EnvConfig, FileConfig};
use crate::validation::{self, ConfigGuardRailError, ConfigWarnings};

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Use these values instead of reading `.env` and the process environment.
    pub env_override: Option<EnvConfig>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.options.env_override = Some(env);
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let (env_config, env_file_loaded) = match &self.options.env_override {
            Some(env) => (env.clone(), false),
            None => {
                let loaded = self.load_env_file()?;
                (EnvConfig::gather(), loaded)
            }
        };

        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let metadata = ConfigMetadata {
            config_path,
            env_file_loaded,
        };
        let (config, warnings) = compose_config(file_config, env_config, metadata)?;

        Ok(ConfigLoad { config, warnings })
    }

    /// A missing `.env` is fine; a malformed one is not.
    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        let result = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };

        result.or_else(|err| match err {
            dotenvy::Error::Io(_) => Ok(false),
            _ => Err(err.into()),
        })
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let mut source = ConfigPathSource::default();

        if let Some(explicit) = &self.options.config_path {
            source.explicit = Some(explicit.clone());
        } else if let Some(from_env) = &env_config.config_path {
            source.env = Some(from_env.clone());
        } else {
            source.default = DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists());
        }

        let Some((path, provenance)) = source.resolved_path() else {
            return Ok((None, None));
        };

        if !path.exists() {
            if provenance.is_explicit() {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Layer environment over file over defaults, then run the guard rails.
fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    metadata: ConfigMetadata,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if metadata.config_path.is_none() {
        warnings.push("No gatekeep.toml detected; using environment variables and defaults");
    }

    let FileConfig {
        server: file_server,
        database: file_database,
        redis: file_redis,
        auth: file_auth,
        dev_mode: file_dev_mode,
    } = file_config.unwrap_or_default();

    let server_defaults = ServerConfig::default();
    let server = ServerConfig {
        host: env
            .server_host
            .or(file_server.host)
            .unwrap_or(server_defaults.host),
        port: parse_number("SERVER_PORT", env.server_port)?
            .or(file_server.port)
            .unwrap_or(server_defaults.port),
        request_timeout: layered_duration(
            "REQUEST_TIMEOUT",
            env.request_timeout,
            file_server.request_timeout,
        )?
        .unwrap_or(server_defaults.request_timeout),
    };

    let database_defaults = DatabaseConfig::default();
    let database = DatabaseConfig {
        url: env
            .database_url
            .or(file_database.url)
            .map(|raw| validate_database_url(&raw))
            .transpose()?,
        max_connections: parse_number("DB_MAX_CONNECTIONS", env.db_max_connections)?
            .or(file_database.max_connections)
            .unwrap_or(database_defaults.max_connections),
        acquire_timeout: layered_duration(
            "DB_ACQUIRE_TIMEOUT",
            env.db_acquire_timeout,
            file_database.acquire_timeout,
        )?
        .unwrap_or(database_defaults.acquire_timeout),
    };

    let redis = env
        .redis_url
        .or(file_redis.map(|redis| redis.url))
        .map(|raw| normalize_redis_url(&raw))
        .transpose()?
        .map(|url| RedisConfig { url });

    let auth_defaults = AuthConfig::default();
    let hashing_defaults = HashingConfig::default();
    let file_hashing = file_auth.hashing;
    let auth = AuthConfig {
        token_key: env
            .token_key
            .or(file_auth.token_key)
            .unwrap_or(auth_defaults.token_key),
        session_ttl: bounded_session_ttl(layered_duration(
            "AUTH_SESSION_TTL",
            env.session_ttl,
            file_auth.session_ttl,
        )?)?
        .unwrap_or(auth_defaults.session_ttl),
        hashing: HashingConfig {
            memory_kib: parse_number("AUTH_ARGON2_MEMORY_KIB", env.argon2_memory_kib)?
                .or(file_hashing.memory_kib)
                .unwrap_or(hashing_defaults.memory_kib),
            iterations: parse_number("AUTH_ARGON2_ITERATIONS", env.argon2_iterations)?
                .or(file_hashing.iterations)
                .unwrap_or(hashing_defaults.iterations),
            parallelism: parse_number("AUTH_ARGON2_PARALLELISM", env.argon2_parallelism)?
                .or(file_hashing.parallelism)
                .unwrap_or(hashing_defaults.parallelism),
        },
    };

    let config = Config {
        server,
        database,
        redis,
        auth,
        dev_mode: env.dev_mode.or(file_dev_mode).unwrap_or(false),
        metadata,
    };

    warnings.extend(validation::apply_guard_rails(&config)?);

    Ok((config, warnings))
}

fn parse_number<T: FromStr>(
    field: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, ConfigLoadError> {
    raw.map(|value| {
        value.parse().map_err(|_| ConfigLoadError::InvalidValue {
            field,
            reason: format!("'{value}' is not a valid number"),
        })
    })
    .transpose()
}

/// Environment beats file. Zero durations are rejected.
fn layered_duration(
    field: &'static str,
    env: Option<String>,
    file: Option<String>,
) -> Result<Option<Duration>, ConfigLoadError> {
    let Some(raw) = env.or(file) else {
        return Ok(None);
    };

    let duration =
        humantime::parse_duration(raw.trim()).map_err(|source| ConfigLoadError::InvalidDuration {
            field,
            source,
        })?;

    if duration.is_zero() {
        return Err(ConfigLoadError::InvalidValue {
            field,
            reason: "must be greater than zero".into(),
        });
    }

    Ok(Some(duration))
}

fn bounded_session_ttl(ttl: Option<Duration>) -> Result<Option<Duration>, ConfigLoadError> {
    match ttl {
        Some(ttl) if ttl > MAX_SESSION_TTL => Err(ConfigLoadError::InvalidValue {
            field: "AUTH_SESSION_TTL",
            reason: format!(
                "must not exceed {}",
                humantime::format_duration(MAX_SESSION_TTL)
            ),
        }),
        other => Ok(other),
    }
}

fn validate_database_url(raw: &str) -> Result<String, ConfigLoadError> {
    let trimmed = raw.trim();
    let parsed =
        Url::parse(trimmed).map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;

    match parsed.scheme() {
        "postgres" | "postgresql" => Ok(trimmed.to_string()),
        other => Err(ConfigLoadError::InvalidValue {
            field: "DATABASE_URL",
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// Accepts a full URL or a bare `host:port` address.
fn normalize_redis_url(raw: &str) -> Result<String, ConfigLoadError> {
    let trimmed = raw.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("redis://{trimmed}")
    };

    let parsed =
        Url::parse(&candidate).map_err(|source| ConfigLoadError::InvalidRedisUrl { source })?;

    match parsed.scheme() {
        "redis" | "rediss" | "redis+unix" | "unix" => Ok(candidate),
        other => Err(ConfigLoadError::InvalidValue {
            field: "REDIS_URL",
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("required setting {name} is not configured")]
    MissingValue { name: &'static str },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("invalid duration for {field}")]
    InvalidDuration {
        field: &'static str,
        #[source]
        source: humantime::DurationError,
    },
    #[error("invalid database URL")]
    InvalidDatabaseUrl {
        #[source]
        source: url::ParseError,
    },
    #[error("invalid Redis URL")]
    InvalidRedisUrl {
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Default)]
struct ConfigPathSource {
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    default: Option<PathBuf>,
}

impl ConfigPathSource {
    fn resolved_path(&self) -> Option<(PathBuf, ConfigPathProvenance)> {
        if let Some(path) = &self.explicit {
            return Some((path.clone(), ConfigPathProvenance::Explicit));
        }
        if let Some(path) = &self.env {
            return Some((path.clone(), ConfigPathProvenance::Env));
        }
        if let Some(path) = &self.default {
            return Some((path.clone(), ConfigPathProvenance::Default));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigPathProvenance {
    Explicit,
    Env,
    Default,
}

impl ConfigPathProvenance {
    fn is_explicit(self) -> bool {
        matches!(
            self,
            ConfigPathProvenance::Explicit | ConfigPathProvenance::Env
        )
    }
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
