//! Configuration for Gatekeep.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables (after `.env` is loaded). The server applies its CLI
//! flags on top of the result. Guard rails run last and either refuse the
//! configuration or attach warnings for the caller to log.

pub mod constants;
pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    AuthConfig, Config, ConfigMetadata, DatabaseConfig, HashingConfig, RedisConfig, ServerConfig,
};
pub use sources::{EnvConfig, FileConfig};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
