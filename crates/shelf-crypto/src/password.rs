use std::fmt;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};

/// Length of the random salt generated for every credential.
const SALT_LEN: usize = 16;

/// Salted one-way password digest in PHC string format (argon2id).
///
/// The PHC string embeds algorithm, parameters, and salt, so a credential
/// can be verified without any side configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordCredential(String);

impl PasswordCredential {
    /// Hash a password with a fresh random salt.
    ///
    /// Hashing the same password twice yields two different credentials.
    pub fn hash(password: &str) -> Result<Self, PasswordError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        rand::Rng::fill(&mut rand::thread_rng(), &mut salt_bytes);
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?
            .to_string();
        Ok(Self(phc))
    }

    /// Wrap a PHC string loaded from storage. Not validated until [`Self::verify`].
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// The PHC string, for persisting.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check a candidate password.
    ///
    /// Returns `false` on mismatch and on a malformed stored credential;
    /// never errors. The digest comparison is constant-time.
    pub fn verify(&self, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.0) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

impl fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordCredential(<redacted>)")
    }
}

/// Errors from credential hashing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_correct_password() {
        let cred = PasswordCredential::hash("moderator123").unwrap();
        assert!(cred.verify("moderator123"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let cred = PasswordCredential::hash("moderator123").unwrap();
        assert!(!cred.verify("moderator124"));
        assert!(!cred.verify(""));
    }

    #[test]
    fn fresh_salt_per_hash() {
        let a = PasswordCredential::hash("same").unwrap();
        let b = PasswordCredential::hash("same").unwrap();
        assert_ne!(a, b);
        assert!(a.verify("same"));
        assert!(b.verify("same"));
    }

    #[test]
    fn digest_does_not_contain_password() {
        let cred = PasswordCredential::hash("plaintext-secret").unwrap();
        assert!(!cred.as_str().contains("plaintext-secret"));
        assert!(cred.as_str().starts_with("$argon2id$"));
    }

    #[test]
    fn malformed_credential_never_verifies() {
        let cred = PasswordCredential::from_phc("not-a-phc-string");
        assert!(!cred.verify("anything"));
    }

    #[test]
    fn stored_credential_round_trips_through_phc() {
        let cred = PasswordCredential::hash("user123").unwrap();
        let loaded = PasswordCredential::from_phc(cred.as_str());
        assert!(loaded.verify("user123"));
    }

    #[test]
    fn debug_is_redacted() {
        let cred = PasswordCredential::hash("secret").unwrap();
        assert_eq!(format!("{cred:?}"), "PasswordCredential(<redacted>)");
    }

    #[test]
    fn serializes_as_phc_string() {
        let cred = PasswordCredential::hash("x").unwrap();
        let json = serde_json::to_string(&cred).unwrap();
        assert_eq!(json, format!("\"{}\"", cred.as_str()));
    }
}
