//! Core library for Gatekeep.
//!
//! Registers identities with Argon2id-hashed secrets, verifies them on login,
//! and issues short-lived HS256 tokens backed by an expiring server-side
//! session record. Storage engines sit behind the [`CredentialStore`] and
//! [`SessionStore`] traits so Postgres/Redis and the in-memory engines are
//! interchangeable.
//!
//! [`CredentialStore`]: auth::domain::CredentialStore
//! [`SessionStore`]: auth::domain::SessionStore

pub mod auth;

pub use auth::domain::{
    AuthCoordinator, AuthError, AuthenticatedSession, Credentials, IssuedToken, Session, UserId,
};

/// Embedded schema migrations for the credential database.
#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
