use std::path::PathBuf;

use serde::Deserialize;

/// Raw configuration as defined in a TOML file.
///
/// Durations are humantime strings (`"15m"`, `"30s"`).
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    pub redis: Option<FileRedisConfig>,
    #[serde(default)]
    pub auth: FileAuthConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub request_timeout: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileDatabaseConfig {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub acquire_timeout: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileRedisConfig {
    pub url: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileAuthConfig {
    pub token_key: Option<String>,
    pub session_ttl: Option<String>,
    #[serde(default)]
    pub hashing: FileHashingConfig,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileHashingConfig {
    pub memory_kib: Option<u32>,
    pub iterations: Option<u32>,
    pub parallelism: Option<u32>,
}

/// Raw values read from the process environment.
///
/// Kept as strings so the loader can report which variable held a bad value.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<String>,
    pub request_timeout: Option<String>,
    pub database_url: Option<String>,
    pub db_max_connections: Option<String>,
    pub db_acquire_timeout: Option<String>,
    pub redis_url: Option<String>,
    pub token_key: Option<String>,
    pub session_ttl: Option<String>,
    pub argon2_memory_kib: Option<String>,
    pub argon2_iterations: Option<String>,
    pub argon2_parallelism: Option<String>,
    pub dev_mode: Option<bool>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            config_path: var("GATEKEEP_CONFIG").map(PathBuf::from),
            server_host: var("SERVER_HOST"),
            server_port: var("SERVER_PORT"),
            request_timeout: var("REQUEST_TIMEOUT"),
            database_url: var("DATABASE_URL").or_else(|| var("POSTGRES_URL")),
            db_max_connections: var("DB_MAX_CONNECTIONS"),
            db_acquire_timeout: var("DB_ACQUIRE_TIMEOUT"),
            redis_url: var("REDIS_URL").or_else(|| var("REDIS_ADDR")),
            token_key: var("JWT_SECRET").or_else(|| var("AUTH_TOKEN_KEY")),
            session_ttl: var("AUTH_SESSION_TTL"),
            argon2_memory_kib: var("AUTH_ARGON2_MEMORY_KIB"),
            argon2_iterations: var("AUTH_ARGON2_ITERATIONS"),
            argon2_parallelism: var("AUTH_ARGON2_PARALLELISM"),
            dev_mode: var("DEV_MODE").and_then(|raw| parse_bool(&raw)),
        }
    }
}

/// Set and non-blank, trimmed.
fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_parses_nested_tables() {
        let raw = r#"
            dev_mode = true

            [server]
            port = 9090
            request_timeout = "10s"

            [database]
            url = "postgres://localhost/gatekeep"

            [redis]
            url = "redis://localhost:6379"

            [auth]
            session_ttl = "5m"

            [auth.hashing]
            memory_kib = 32768
        "#;

        let parsed: FileConfig = toml::from_str(raw).unwrap();
        assert_eq!(parsed.server.port, Some(9090));
        assert_eq!(parsed.server.request_timeout.as_deref(), Some("10s"));
        assert_eq!(
            parsed.database.url.as_deref(),
            Some("postgres://localhost/gatekeep")
        );
        assert_eq!(parsed.redis.unwrap().url, "redis://localhost:6379");
        assert_eq!(parsed.auth.session_ttl.as_deref(), Some("5m"));
        assert_eq!(parsed.auth.hashing.memory_kib, Some(32768));
        assert_eq!(parsed.dev_mode, Some(true));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let raw = "[server]\nprot = 8080\n";
        assert!(toml::from_str::<FileConfig>(raw).is_err());
    }

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
