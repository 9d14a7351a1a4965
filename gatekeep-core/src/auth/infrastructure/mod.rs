//! Backing engines for the credential and session stores.

pub mod memory;
#[cfg(feature = "database")]
pub mod postgres_credentials;
#[cfg(feature = "database")]
pub mod redis_sessions;

pub use memory::{InMemoryCredentialStore, InMemorySessionStore};
#[cfg(feature = "database")]
pub use postgres_credentials::PostgresCredentialStore;
#[cfg(feature = "database")]
pub use redis_sessions::RedisSessionStore;
