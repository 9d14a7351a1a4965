mod coordinator;

pub use coordinator::{
    AuthCoordinator, AuthError, AuthenticatedSession, DEFAULT_SESSION_TTL_SECS, IssuedToken,
    MAX_SESSION_TTL_SECS,
};
