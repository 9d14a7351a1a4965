use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, ParamsBuilder, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
};
use password_hash::Error as PasswordHashError;
use rand::{TryRngCore, rngs::OsRng};
use thiserror::Error;
use zeroize::Zeroizing;

/// Argon2id cost knobs. Higher values slow down offline guessing at the price
/// of server CPU and memory per login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl HashingCost {
    /// Cheapest parameters Argon2 accepts. Only meant for tests.
    pub const fn minimal() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }
}

impl Default for HashingCost {
    /// ~64 MiB and 3 passes: a solid baseline for servers without dedicated
    /// tuning.
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum HashingError {
    #[error("invalid Argon2 parameters: {0}")]
    InvalidParams(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
    #[error("hashing task failed: {0}")]
    Task(String),
}

impl From<PasswordHashError> for HashingError {
    fn from(err: PasswordHashError) -> Self {
        HashingError::PasswordHash(err.to_string())
    }
}

/// Salted one-way hashing of user secrets.
///
/// Produces PHC strings (`$argon2id$v=19$m=...`) that embed the salt and the
/// cost, so stored hashes stay verifiable after the configured cost changes.
/// Verification goes through the PHC verifier, never a byte comparison of
/// secrets.
#[derive(Debug)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    cost: HashingCost,
    /// Verified against when a username does not exist so that unknown users
    /// and wrong passwords cost the same.
    dummy_hash: String,
}

impl PasswordHasher {
    const SALT_LENGTH: usize = password_hash::Salt::RECOMMENDED_LENGTH;

    pub fn new(cost: HashingCost) -> Result<Self, HashingError> {
        let params = ParamsBuilder::new()
            .m_cost(cost.memory_kib)
            .t_cost(cost.iterations)
            .p_cost(cost.parallelism)
            .output_len(32)
            .build()
            .map_err(|err| HashingError::InvalidParams(err.to_string()))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::default(), params);

        let mut hasher = Self {
            argon2,
            cost,
            dummy_hash: String::new(),
        };
        hasher.dummy_hash = hasher.hash_password("gatekeep-dummy-secret")?;
        Ok(hasher)
    }

    pub fn cost(&self) -> HashingCost {
        self.cost
    }

    /// Hash a secret with a fresh random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, HashingError> {
        let material = Zeroizing::new(password.as_bytes().to_vec());

        let mut salt_bytes = [0u8; Self::SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|err| HashingError::PasswordHash(err.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes)?;

        let hash = self.argon2.hash_password(&material, &salt)?.to_string();
        Ok(hash)
    }

    /// Verify a secret against a stored PHC string. A malformed stored hash is
    /// an error, a mismatch is `Ok(false)`.
    pub fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, HashingError> {
        let parsed = PasswordHash::new(password_hash)?;
        let material = Zeroizing::new(password.as_bytes().to_vec());

        Ok(self.argon2.verify_password(&material, &parsed).is_ok())
    }

    /// Burn one verification so a lookup miss is not observably faster than a
    /// wrong password.
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify_password(password, &self.dummy_hash);
    }

    /// [`Self::hash_password`] on the blocking pool.
    pub async fn hash_blocking(
        self: &Arc<Self>,
        password: Zeroizing<String>,
    ) -> Result<String, HashingError> {
        let hasher = Arc::clone(self);
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|err| HashingError::Task(err.to_string()))?
    }

    /// [`Self::verify_password`] on the blocking pool. `None` for the stored
    /// hash runs the dummy verification and reports a mismatch.
    pub async fn verify_blocking(
        self: &Arc<Self>,
        password: Zeroizing<String>,
        password_hash: Option<String>,
    ) -> Result<bool, HashingError> {
        let hasher = Arc::clone(self);
        tokio::task::spawn_blocking(move || match password_hash {
            Some(hash) => hasher.verify_password(&password, &hash),
            None => {
                hasher.verify_dummy(&password);
                Ok(false)
            }
        })
        .await
        .map_err(|err| HashingError::Task(err.to_string()))?
    }
}
