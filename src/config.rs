//! Core configuration.

use crate::credentials::HashCost;

const DEFAULT_RESET_TOKEN_TTL_SECONDS: i64 = 2 * 60 * 60;

/// Tunables for the identity core: digest work factor and the validity
/// window for password-reset tokens.
#[derive(Clone, Copy, Debug)]
pub struct CoreConfig {
    hash_cost: HashCost,
    reset_token_ttl_seconds: i64,
}

impl CoreConfig {
    /// Default config: production-grade hashing and a 2 hour reset window.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hash_cost: HashCost::Standard,
            reset_token_ttl_seconds: DEFAULT_RESET_TOKEN_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_hash_cost(mut self, hash_cost: HashCost) -> Self {
        self.hash_cost = hash_cost;
        self
    }

    #[must_use]
    pub fn with_reset_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn hash_cost(&self) -> HashCost {
        self.hash_cost
    }

    #[must_use]
    pub fn reset_token_ttl_seconds(&self) -> i64 {
        self.reset_token_ttl_seconds
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new()
    }
}
