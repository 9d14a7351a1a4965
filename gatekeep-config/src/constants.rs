use std::time::Duration;

pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DB_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Placeholder signing key. Refused outside dev mode.
pub const DEFAULT_TOKEN_KEY: &str = "change-me-token-signing-key";
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(15 * 60);
/// Longer lifetimes are refused at load time.
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

pub const DEFAULT_ARGON2_MEMORY_KIB: u32 = 64 * 1024;
pub const DEFAULT_ARGON2_ITERATIONS: u32 = 3;
pub const DEFAULT_ARGON2_PARALLELISM: u32 = 1;

/// Candidate config files probed when no path is given.
pub const DEFAULT_CONFIG_LOCATIONS: &[&str] = &["gatekeep.toml", "config/gatekeep.toml"];
