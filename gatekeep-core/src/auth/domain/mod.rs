pub mod model;
pub mod repositories;
pub mod services;

pub use model::{Credentials, Session, UserId};
pub use repositories::{CredentialStore, CredentialStoreError, SessionStore, SessionStoreError};
pub use services::{AuthCoordinator, AuthError, AuthenticatedSession, IssuedToken};
