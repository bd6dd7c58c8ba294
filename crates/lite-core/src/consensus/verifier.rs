use crate::consensus::config::{ConfigError, VerifierConfig};
use crate::consensus::quorum::{QuorumError, ValidatorSet};
use crate::consensus::trust_level::TrustLevel;
use crate::consensus::trusted_state::TrustedState;
use crate::types::{Hash, HeaderError, SignedHeader};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Reasons a new header cannot be trusted.
/// Each variant calls for a different reaction from the caller, so none are merged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("Last header expired at {expired_at} and is too old to be trusted now ({now}); the verifier must be reset subjectively")]
    Expired {
        expired_at: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("New header failed basic validation: {0}")]
    InvalidHeader(#[from] HeaderError),

    #[error("New header height {new_height} is not greater than trusted height {trusted_height}")]
    NonIncreasingHeight { new_height: u64, trusted_height: u64 },

    #[error("New header time {new_time} is not after trusted header time {trusted_time}")]
    NonIncreasingTime {
        new_time: DateTime<Utc>,
        trusted_time: DateTime<Utc>,
    },

    #[error("New header time {header_time} is from the future (now: {now})")]
    HeaderFromFuture {
        header_time: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("New header time {header_time} is too far into the future to trust; trusting period ends at {trusted_until}")]
    HeaderTooFarInFuture {
        header_time: DateTime<Utc>,
        trusted_until: DateTime<Utc>,
    },

    #[error("Expected validators hash {expected}, but the new header claims {got}")]
    ValidatorSetMismatch { expected: Hash, got: Hash },

    #[error("Trusted validators did not sign with enough power: {0}")]
    InsufficientTrustLevelVotingPower(#[source] QuorumError),

    #[error("New validators did not sign with 2/3 of their power: {0}")]
    InsufficientVotingPower(#[source] QuorumError),
}

impl VerifyError {
    /// The trusted checkpoint is stale and must be replaced out of band.
    pub fn is_expired(&self) -> bool {
        matches!(self, VerifyError::Expired { .. })
    }

    /// The header may still be reachable through an intermediate header.
    pub fn should_bisect(&self) -> bool {
        matches!(
            self,
            VerifyError::HeaderTooFarInFuture { .. }
                | VerifyError::InsufficientTrustLevelVotingPower(_)
        )
    }
}

/// Decides whether new headers can be trusted, starting from one trusted
/// checkpoint.
///
/// Verification is read-only. The checkpoint sits behind an `Arc` and is
/// never modified, so one verifier can serve concurrent calls, and rotating
/// the checkpoint means building a new verifier with
/// [`Verifier::with_trusted_state`].
#[derive(Clone, Debug)]
pub struct Verifier<V> {
    chain_id: String,
    trusting_period: Duration,
    trusting_period_delta: chrono::Duration,
    trust_level: TrustLevel,
    state: Arc<TrustedState<V>>,
}

impl<V: ValidatorSet> Verifier<V> {
    pub fn new(config: VerifierConfig, trusted_state: TrustedState<V>) -> Result<Self, ConfigError> {
        Self::from_shared(config, Arc::new(trusted_state))
    }

    /// Like [`Verifier::new`], for a checkpoint already shared with other verifiers.
    pub fn from_shared(
        config: VerifierConfig,
        trusted_state: Arc<TrustedState<V>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let trusting_period_delta = config.trusting_period_delta()?;

        Ok(Self {
            chain_id: config.chain_id,
            trusting_period: config.trusting_period,
            trusting_period_delta,
            trust_level: config.trust_level,
            state: trusted_state,
        })
    }

    /// A verifier with the same configuration anchored at `trusted_state`.
    pub fn with_trusted_state(&self, trusted_state: impl Into<Arc<TrustedState<V>>>) -> Self {
        Self {
            chain_id: self.chain_id.clone(),
            trusting_period: self.trusting_period,
            trusting_period_delta: self.trusting_period_delta,
            trust_level: self.trust_level,
            state: trusted_state.into(),
        }
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn trusting_period(&self) -> Duration {
        self.trusting_period
    }

    pub fn trust_level(&self) -> TrustLevel {
        self.trust_level
    }

    pub fn trusted_state(&self) -> &Arc<TrustedState<V>> {
        &self.state
    }

    /// End of the trusting period of the current checkpoint.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.state
            .last_header()
            .time
            .checked_add_signed(self.trusting_period_delta)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Verify `new_header` against the trusted checkpoint.
    ///
    /// `vals` must be the validator set for `new_header.height()`, and `now`
    /// the caller's own clock. The checks run in a fixed order and the first
    /// failure is returned:
    /// 1. The checkpoint has not expired
    /// 2. The header is well formed, newer than the checkpoint, within the
    ///    trusting period and signed by `vals`
    /// 3. For the next height, the trusted validators must be `vals` and 2/3
    ///    of them must have signed. For a later height, `trust_level` of the
    ///    trusted validators and 2/3 of `vals` must have signed.
    ///
    /// A successful result does not move the checkpoint; that is up to the caller.
    pub fn verify(
        &self,
        new_header: &SignedHeader,
        vals: &V,
        now: DateTime<Utc>,
    ) -> Result<(), VerifyError> {
        let result = self
            .check_expired(now)
            .and_then(|_| self.verify_new_header_and_vals(new_header, vals, now))
            .and_then(|_| self.verify_quorum(new_header, vals));

        match &result {
            Ok(()) => debug!(
                height = new_header.height(),
                trusted_height = self.state.height(),
                "header verified"
            ),
            Err(e) => debug!(
                height = new_header.height(),
                trusted_height = self.state.height(),
                error = %e,
                "header rejected"
            ),
        }

        result
    }

    fn check_expired(&self, now: DateTime<Utc>) -> Result<(), VerifyError> {
        let expired_at = self.expires_at();
        if expired_at <= now {
            return Err(VerifyError::Expired { expired_at, now });
        }
        Ok(())
    }

    fn verify_new_header_and_vals(
        &self,
        new_header: &SignedHeader,
        vals: &V,
        now: DateTime<Utc>,
    ) -> Result<(), VerifyError> {
        new_header.validate_basic(&self.chain_id)?;

        let trusted = self.state.last_header();

        if new_header.height() <= trusted.height {
            return Err(VerifyError::NonIncreasingHeight {
                new_height: new_header.height(),
                trusted_height: trusted.height,
            });
        }

        if new_header.time() <= trusted.time {
            return Err(VerifyError::NonIncreasingTime {
                new_time: new_header.time(),
                trusted_time: trusted.time,
            });
        }

        // Checked before the clock so a header past the trusting period
        // reports that, rather than looking like clock skew.
        let trusted_until = self.expires_at();
        if new_header.time() >= trusted_until {
            return Err(VerifyError::HeaderTooFarInFuture {
                header_time: new_header.time(),
                trusted_until,
            });
        }

        if new_header.time() >= now {
            return Err(VerifyError::HeaderFromFuture {
                header_time: new_header.time(),
                now,
            });
        }

        let vals_hash = vals.hash();
        if new_header.header.validators_hash != vals_hash {
            return Err(VerifyError::ValidatorSetMismatch {
                expected: vals_hash,
                got: new_header.header.validators_hash,
            });
        }

        trace!(height = new_header.height(), "header and validators consistent");
        Ok(())
    }

    fn verify_quorum(&self, new_header: &SignedHeader, vals: &V) -> Result<(), VerifyError> {
        let commit = &new_header.commit;
        let height = new_header.height();

        // height > trusted height was checked above
        if height - self.state.height() == 1 {
            let trusted_hash = self.state.validators().hash();
            if new_header.header.validators_hash != trusted_hash {
                return Err(VerifyError::ValidatorSetMismatch {
                    expected: trusted_hash,
                    got: new_header.header.validators_hash,
                });
            }

            trace!(height, "adjacent header, checking 2/3 of validators");
            vals.verify_commit(&self.chain_id, &commit.block_id, height, commit)
                .map_err(VerifyError::InsufficientVotingPower)?;
        } else {
            trace!(
                height,
                trusted_height = self.state.height(),
                trust_level = %self.trust_level,
                "non-adjacent header, checking trusted validators"
            );
            self.state
                .validators()
                .verify_commit_trusting(
                    &self.chain_id,
                    &commit.block_id,
                    height,
                    commit,
                    self.trust_level,
                )
                .map_err(VerifyError::InsufficientTrustLevelVotingPower)?;

            vals.verify_commit(&self.chain_id, &commit.block_id, height, commit)
                .map_err(VerifyError::InsufficientVotingPower)?;
        }

        Ok(())
    }
}
