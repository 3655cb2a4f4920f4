use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use log::{debug, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

pub const INITIAL_CREDENTIAL_LENGTH: usize = 16;
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argon2Config {
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
    pub output_length: usize,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_cost_kib: 19456,
            time_cost: 2,
            parallelism: 1,
            output_length: 32,
        }
    }
}

impl Argon2Config {
    pub fn low_memory() -> Self {
        Self {
            memory_cost_kib: 8192,
            time_cost: 1,
            parallelism: 1,
            output_length: 32,
        }
    }
}

#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    decoy_hash: Arc<OnceLock<Option<String>>>,
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher").finish_non_exhaustive()
    }
}

impl CredentialHasher {
    pub fn new(config: &Argon2Config) -> Result<Self> {
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            Some(config.output_length),
        )
        .map_err(|e| anyhow!("Invalid Argon2 parameters: {e}"))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            decoy_hash: Arc::new(OnceLock::new()),
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(&Argon2Config::default())
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("Failed to hash password: {e}"))?;

        Ok(hash.to_string())
    }

    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password hash is malformed: {e}");
                return false;
            }
        };
        let ok = self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();
        debug!("Password verification result: {ok}");
        ok
    }

    /// Spends the same argon2 work as [`Self::verify`] for an account that
    /// does not exist. Always false.
    pub fn verify_decoy(&self, password: &str) -> bool {
        let decoy = self
            .decoy_hash
            .get_or_init(|| self.hash(&generate_initial_credential()).ok());
        if let Some(hash) = decoy {
            self.verify(password, hash);
        }
        false
    }
}

/// Random alphanumeric credential for a newly created agent account.
pub fn generate_initial_credential() -> String {
    rand::rngs::OsRng
        .sample_iter(&Alphanumeric)
        .take(INITIAL_CREDENTIAL_LENGTH)
        .map(char::from)
        .collect()
}

pub fn validate_password(password: &str) -> Result<(), String> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters (currently {length})"
        ));
    }
    if password.chars().all(char::is_whitespace) {
        return Err("Password must not be blank".to_string());
    }
    Ok(())
}
