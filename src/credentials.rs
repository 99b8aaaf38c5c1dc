//! Password and token digests.
//!
//! Digests are salted Argon2id strings in PHC format. The work factor is
//! configurable so tests and other lightweight contexts stay fast while
//! production keeps the library defaults.

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;

/// Work factor applied when hashing secrets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashCost {
    /// Production-grade parameters (the argon2 defaults).
    Standard,
    /// Minimal parameters for tests and local tooling.
    Fast,
}

/// Hashes and verifies secrets. Never stores anything; pure over inputs.
#[derive(Clone)]
pub struct CredentialStore {
    argon2: Argon2<'static>,
}

impl CredentialStore {
    #[must_use]
    pub fn new(cost: HashCost) -> Self {
        let params = match cost {
            HashCost::Standard => argon2::Params::default(),
            HashCost::Fast => argon2::Params::new(
                argon2::Params::MIN_M_COST,
                argon2::Params::MIN_T_COST,
                argon2::Params::MIN_P_COST,
                None,
            )
            .unwrap_or_default(),
        };

        Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        }
    }

    /// Hash a secret with a fresh random salt.
    pub fn hash(&self, secret: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|err| anyhow::anyhow!("failed to hash secret: {err}"))?
            .to_string();
        Ok(digest)
    }

    /// Check a candidate against a stored digest.
    ///
    /// An absent or unparseable digest verifies as `false`, never as an
    /// error; callers cannot distinguish the two cases.
    #[must_use]
    pub fn verify(&self, digest: Option<&str>, candidate: &str) -> bool {
        let Some(digest) = digest else {
            return false;
        };
        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };
        self.argon2
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::{CredentialStore, HashCost};

    #[test]
    fn hash_and_verify_round_trip() {
        let credentials = CredentialStore::new(HashCost::Fast);
        let digest = credentials.hash("foobar").unwrap();
        assert!(credentials.verify(Some(&digest), "foobar"));
        assert!(!credentials.verify(Some(&digest), "barfoo"));
    }

    #[test]
    fn hashes_are_salted() {
        let credentials = CredentialStore::new(HashCost::Fast);
        let first = credentials.hash("foobar").unwrap();
        let second = credentials.hash("foobar").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn verify_is_false_without_digest() {
        let credentials = CredentialStore::new(HashCost::Fast);
        assert!(!credentials.verify(None, "anything"));
    }

    #[test]
    fn verify_is_false_for_malformed_digest() {
        let credentials = CredentialStore::new(HashCost::Fast);
        assert!(!credentials.verify(Some("not-a-phc-string"), "anything"));
    }
}
