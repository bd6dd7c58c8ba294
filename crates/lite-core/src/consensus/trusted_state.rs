use crate::consensus::quorum::ValidatorSet;
use crate::types::{Hash, Header};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrustedStateError {
    #[error("Validators hash {got} does not match next validators hash {expected} of header {height}")]
    NextValidatorsMismatch {
        height: u64,
        expected: Hash,
        got: Hash,
    },
}

/// The latest state trusted by a light client: the last header and the
/// validator set that signs the header after it.
///
/// A `TrustedState` is never modified. Moving the checkpoint forward means
/// building a new one with [`TrustedState::successor`]. Persisted
/// checkpoints are restored through [`TrustedState::new`] so the
/// next-validators binding is always checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrustedState<V> {
    last_header: Header,
    /// Validators for height `last_header.height + 1`.
    validators: V,
}

impl<V: ValidatorSet> TrustedState<V> {
    /// Anchor trust at `last_header`. This is the one moment of subjective
    /// trust: the header must come from an out-of-band checkpoint.
    pub fn new(last_header: Header, validators: V) -> Result<Self, TrustedStateError> {
        let got = validators.hash();
        if got != last_header.next_validators_hash {
            return Err(TrustedStateError::NextValidatorsMismatch {
                height: last_header.height,
                expected: last_header.next_validators_hash,
                got,
            });
        }
        Ok(Self {
            last_header,
            validators,
        })
    }

    /// The checkpoint that follows a successful verification of `new_header`.
    /// `next_validators` must be the set named by `new_header.next_validators_hash`.
    pub fn successor(new_header: Header, next_validators: V) -> Result<Self, TrustedStateError> {
        Self::new(new_header, next_validators)
    }
}

impl<V> TrustedState<V> {
    pub fn last_header(&self) -> &Header {
        &self.last_header
    }

    pub fn validators(&self) -> &V {
        &self.validators
    }

    pub fn height(&self) -> u64 {
        self.last_header.height
    }
}
