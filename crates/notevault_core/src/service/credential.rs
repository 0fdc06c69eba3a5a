//! Password hashing for the identity registry.
//!
//! # Invariants
//! - Stored credentials are argon2id PHC strings with a random salt.
//! - Verification never reveals whether the hash or the password was at fault.
//! - Checking a password for a missing account costs one argon2 verification,
//!   the same as a wrong password.

use crate::service::ServiceError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use log::warn;
use once_cell::sync::OnceCell;

const DECOY_PASSWORD: &str = "notevault-decoy-credential";

/// Argon2 wrapper with configurable cost.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    /// Hash made with this hasher's cost, verified against when no stored
    /// credential exists.
    decoy: OnceCell<String>,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
            decoy: OnceCell::new(),
        }
    }
}

impl CredentialHasher {
    /// Builds a hasher with explicit argon2id cost parameters.
    ///
    /// `memory_kib` must be at least `8 * parallelism`.
    pub fn with_cost(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, ServiceError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|err| ServiceError::Credential(err.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            decoy: OnceCell::new(),
        })
    }

    /// Hashes a password into a PHC string.
    pub fn hash(&self, password: &str) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| ServiceError::Credential(err.to_string()))
    }

    /// Checks a password against a stored PHC string.
    ///
    /// Parameters embedded in the stored hash win over this hasher's cost,
    /// so hashes created with a different cost still verify.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Runs a full verification for an account that does not exist.
    ///
    /// Always returns `false`.
    pub fn verify_missing(&self, password: &str) -> bool {
        match self.decoy.get_or_try_init(|| self.hash(DECOY_PASSWORD)) {
            Ok(decoy) => {
                let _ = self.verify(password, decoy);
            }
            Err(err) => {
                warn!("event=credential_decoy module=credential status=error error={err}");
            }
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn has_decoy(&self) -> bool {
        self.decoy.get().is_some()
    }
}
