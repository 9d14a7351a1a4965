use std::time::Duration;

use thiserror::Error;

use crate::models::{AuthConfig, Config};

/// Shortest signing key accepted without a warning.
pub const MIN_SECRET_LENGTH: usize = 32;
/// Session lifetimes above this draw a warning.
pub const MAX_QUIET_SESSION_TTL: Duration = Duration::from_secs(60 * 60);
/// OWASP floor for Argon2id memory.
pub const MIN_ARGON2_MEMORY_KIB: u32 = 19 * 1024;

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("authentication secret {field} {reason}")]
    WeakSecret { field: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(&mut self, message: S, hint: H) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

pub fn apply_guard_rails(config: &Config) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    enforce_secret(&config.auth, config.dev_mode, &mut warnings)?;

    if config.auth.session_ttl > MAX_QUIET_SESSION_TTL {
        warnings.push_with_hint(
            format!(
                "session lifetime {} exceeds one hour",
                humantime::format_duration(config.auth.session_ttl)
            ),
            "Long-lived bearer tokens cannot be revoked before expiry; prefer AUTH_SESSION_TTL=15m",
        );
    }

    if config.auth.hashing.memory_kib < MIN_ARGON2_MEMORY_KIB {
        warnings.push_with_hint(
            format!(
                "Argon2 memory cost {} KiB is below the recommended 19 MiB",
                config.auth.hashing.memory_kib
            ),
            "Raise AUTH_ARGON2_MEMORY_KIB unless this is a test deployment",
        );
    }

    if config.dev_mode {
        warnings.push("DEV_MODE is enabled; secret guard rails are relaxed");
    }

    Ok(warnings)
}

fn enforce_secret(
    auth: &AuthConfig,
    dev_mode: bool,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigGuardRailError> {
    if auth.is_default_token_key() {
        if !dev_mode {
            return Err(ConfigGuardRailError::WeakSecret {
                field: "JWT_SECRET",
                reason: "uses the default placeholder value".into(),
            });
        }
        warnings.push_with_hint(
            "JWT_SECRET not set; signing tokens with the built-in placeholder key",
            "Set JWT_SECRET to a random value of at least 32 characters",
        );
        return Ok(());
    }

    if auth.token_key.len() < MIN_SECRET_LENGTH {
        warnings.push_with_hint(
            format!("JWT_SECRET is shorter than {MIN_SECRET_LENGTH} characters"),
            "Generate one with `openssl rand -base64 48`",
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConfigMetadata, DatabaseConfig, HashingConfig, ServerConfig};

    fn config_with(auth: AuthConfig, dev_mode: bool) -> Config {
        Config {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            redis: None,
            auth,
            dev_mode,
            metadata: ConfigMetadata::default(),
        }
    }

    fn strong_auth() -> AuthConfig {
        AuthConfig {
            token_key: "k".repeat(48),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn strong_defaults_produce_no_warnings() {
        let warnings = apply_guard_rails(&config_with(strong_auth(), false)).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn placeholder_key_is_refused_outside_dev_mode() {
        let result = apply_guard_rails(&config_with(AuthConfig::default(), false));
        assert!(matches!(
            result,
            Err(ConfigGuardRailError::WeakSecret { field: "JWT_SECRET", .. })
        ));
    }

    #[test]
    fn placeholder_key_only_warns_in_dev_mode() {
        let warnings = apply_guard_rails(&config_with(AuthConfig::default(), true)).unwrap();
        assert!(warnings.iter().any(|w| w.message.contains("placeholder")));
    }

    #[test]
    fn short_key_long_ttl_and_cheap_hashing_each_warn() {
        let auth = AuthConfig {
            token_key: "short".into(),
            session_ttl: Duration::from_secs(2 * 60 * 60),
            hashing: HashingConfig {
                memory_kib: 8 * 1024,
                ..HashingConfig::default()
            },
        };

        let warnings = apply_guard_rails(&config_with(auth, false)).unwrap();
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().all(|w| w.hint.is_some()));
    }
}
