// common/src/credentials.rs
use crate::error::AuthError;
use crate::models::Identity;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use dashmap::DashMap;
use password_hash::{PasswordHash, SaltString};

/// Decides whether a password belongs to an identity.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, identity: &Identity, password: &str) -> bool;
}

/// Argon2 credentials stored as PHC strings, keyed by lowercase email.
#[derive(Debug, Default)]
pub struct SaltedHashVerifier {
    credentials: DashMap<String, String>,
}

impl SaltedHashVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the password for an email with a fresh salt
    pub fn enroll(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let phc = hash_password(password)?;
        self.credentials.insert(email.to_lowercase(), phc);
        Ok(())
    }

    /// Enrol every identity with the same password. Used for demo directories.
    pub fn with_shared_password<'a>(
        identities: impl IntoIterator<Item = &'a Identity>,
        password: &str,
    ) -> Result<Self, AuthError> {
        let verifier = Self::new();
        for identity in identities {
            verifier.enroll(&identity.email, password)?;
        }
        Ok(verifier)
    }
}

impl CredentialVerifier for SaltedHashVerifier {
    fn verify(&self, identity: &Identity, password: &str) -> bool {
        match self.credentials.get(&identity.email.to_lowercase()) {
            Some(phc) => verify_password(phc.value(), password),
            None => false,
        }
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|e| AuthError::AuthServiceUnavailable(format!("no entropy for salt: {}", e)))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AuthError::AuthServiceUnavailable(e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::AuthServiceUnavailable(e.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(phc: &str, password: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::warn!("Stored credential is not a PHC string: {}", e);
            false
        }
    }
}
