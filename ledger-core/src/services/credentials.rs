//! Credential hashing
//!
//! Passwords are stretched with Argon2id over a random 16-byte salt. The
//! stored form is `argon2id$<salt b64>$<hash b64>`; the cost parameters come
//! from configuration and must stay stable for existing hashes to verify.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use rand::RngCore;

use crate::domain::result::{Error, Result};
use crate::domain::CredentialParams;

const SCHEME: &str = "argon2id";
const SALT_LEN: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct CredentialHasher {
    params: CredentialParams,
}

impl CredentialHasher {
    pub fn new(params: CredentialParams) -> Self {
        Self { params }
    }

    /// Hash a password with a fresh salt
    pub fn hash(&self, password: &str) -> Result<String> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        let hash = self.derive(password, &salt)?;
        let engine = base64::engine::general_purpose::STANDARD;
        Ok(format!(
            "{}${}${}",
            SCHEME,
            engine.encode(salt),
            engine.encode(hash)
        ))
    }

    /// Check a password against a stored credential
    ///
    /// Malformed credentials never verify.
    pub fn verify(&self, password: &str, stored: &str) -> Result<bool> {
        let mut parts = stored.split('$');
        let (Some(SCHEME), Some(salt), Some(expected), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Ok(false);
        };

        let engine = base64::engine::general_purpose::STANDARD;
        let (Ok(salt), Ok(expected)) = (engine.decode(salt), engine.decode(expected)) else {
            return Ok(false);
        };
        if salt.len() != SALT_LEN || expected.len() != self.params.hash_len as usize {
            return Ok(false);
        }

        let actual = self.derive(password, &salt)?;
        Ok(constant_time_eq(&actual, &expected))
    }

    fn derive(&self, password: &str, salt: &[u8]) -> Result<Vec<u8>> {
        let params = Params::new(
            self.params.memory_cost,
            self.params.time_cost,
            self.params.parallelism,
            Some(self.params.hash_len as usize),
        )
        .map_err(|e| Error::Config(format!("invalid argon2 parameters: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let mut output = vec![0u8; self.params.hash_len as usize];
        argon2
            .hash_password_into(password.as_bytes(), salt, &mut output)
            .map_err(|e| Error::Config(format!("failed to hash credential: {}", e)))?;
        Ok(output)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
