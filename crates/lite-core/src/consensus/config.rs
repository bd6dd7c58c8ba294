use crate::consensus::trust_level::{InvalidTrustLevel, TrustLevel};
use crate::types::MAX_CHAIN_ID_LEN;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while building a verifier configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Chain id must not be empty")]
    EmptyChainId,

    #[error("Chain id is {len} bytes long (max {max})")]
    ChainIdTooLong { len: usize, max: usize },

    #[error("Trusting period must be greater than zero")]
    ZeroTrustingPeriod,

    #[error("Trusting period {0:?} is too large to represent")]
    TrustingPeriodOutOfRange(Duration),

    #[error(transparent)]
    InvalidTrustLevel(#[from] InvalidTrustLevel),

    #[error("Invalid verifier config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parameters fixed for the lifetime of a [`Verifier`](crate::consensus::Verifier).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Chain every verified header must belong to.
    pub chain_id: String,
    /// How long a trusted header may anchor verification. Should be shorter
    /// than the chain's unbonding period.
    pub trusting_period: Duration,
    /// Fraction of the trusted validator set's power required to skip ahead.
    ///
    /// Defaults to 1/3. A higher level makes a malicious validator set change
    /// harder to sneak through, but also makes it less likely that a
    /// non-adjacent header verifies when the set changes often.
    #[serde(default)]
    pub trust_level: TrustLevel,
}

impl VerifierConfig {
    pub fn new(chain_id: impl Into<String>, trusting_period: Duration) -> Self {
        Self {
            chain_id: chain_id.into(),
            trusting_period,
            trust_level: TrustLevel::default(),
        }
    }

    pub fn with_trust_level(mut self, trust_level: TrustLevel) -> Self {
        self.trust_level = trust_level;
        self
    }

    /// Parse a JSON config and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: VerifierConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id.is_empty() {
            return Err(ConfigError::EmptyChainId);
        }
        if self.chain_id.len() > MAX_CHAIN_ID_LEN {
            return Err(ConfigError::ChainIdTooLong {
                len: self.chain_id.len(),
                max: MAX_CHAIN_ID_LEN,
            });
        }
        if self.trusting_period.is_zero() {
            return Err(ConfigError::ZeroTrustingPeriod);
        }
        self.trusting_period_delta()?;
        Ok(())
    }

    /// The trusting period as a signed time delta for timestamp arithmetic.
    pub(crate) fn trusting_period_delta(&self) -> Result<chrono::Duration, ConfigError> {
        chrono::Duration::from_std(self.trusting_period)
            .map_err(|_| ConfigError::TrustingPeriodOutOfRange(self.trusting_period))
    }
}
