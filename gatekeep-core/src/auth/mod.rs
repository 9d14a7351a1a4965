//! Credential storage, session records, token issuance, and the
//! register/login protocol built on top of them.

pub mod crypto;
pub mod domain;
pub mod infrastructure;
pub mod token;

pub use crypto::{HashingCost, HashingError, PasswordHasher};
pub use token::{Claims, TokenError, TokenIssuer};
