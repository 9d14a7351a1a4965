//! # Gatekeep Server
//!
//! HTTP front end for the Gatekeep authentication core.
//!
//! - `POST /auth/register` creates an identity from a username and password
//! - `POST /auth/login` exchanges valid credentials for a signed session token
//! - `GET /auth/session` reports the identity behind a bearer token
//!
//! Credentials live in PostgreSQL and session records in Redis; both can be
//! swapped for in-memory engines during development.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
pub use routes::create_app;
