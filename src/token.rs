//! Opaque random tokens for remember, activation, and reset flows.
//!
//! Raw tokens are handed to the caller (session cookie, email link) and
//! never persisted; only their digests are stored.

use anyhow::{Context, Result};
use base64::Engine;
use rand::{RngCore, rngs::OsRng};

use crate::credentials::CredentialStore;

const TOKEN_BYTES: usize = 32;

/// Issues URL-safe random tokens and their storable digests.
#[derive(Clone)]
pub struct TokenIssuer {
    credentials: CredentialStore,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(credentials: CredentialStore) -> Self {
        Self { credentials }
    }

    /// Generate a new opaque token from OS randomness.
    pub fn new_token() -> Result<String> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .context("failed to generate token")?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Digest a raw token for storage.
    pub fn digest_for(&self, token: &str) -> Result<String> {
        self.credentials.hash(token)
    }
}
