//! # Lite Core
//!
//! Pure Rust light client header verification.
//!
//! This crate contains **no networking code** and never advances its own
//! checkpoint. Given one trusted header and the validator set that signs the
//! block after it, it decides whether a newly received signed header can be
//! trusted, without replaying the blocks in between.
//!
//! ## Trust Model
//!
//! - **Checkpoint** (`TrustedState`): the one moment of subjective trust. It
//!   anchors verification only for the trusting period; after that the
//!   client must be reset from a fresh checkpoint.
//!
//! - **Adjacent headers**: the trusted validator set must be the header's
//!   set, and 2/3+ of its voting power must have signed.
//!
//! - **Skip verification**: for a later header, at least the trust level
//!   (1/3 by default) of the *trusted* set must have signed, so at least one
//!   honest validator vouches for it, and 2/3+ of the header's own set.
//!
//! - **Quorum accounting** (`ValidatorSet` trait): signature checks and
//!   voting power tallies. `BlsValidatorSet` implements it with BLS12-381.
//!
//! ## Usage
//!
//! ```ignore
//! use lite_core::{TrustedState, Verifier, VerifierConfig};
//!
//! let state = TrustedState::new(checkpoint_header, next_validators)?;
//! let verifier = Verifier::new(VerifierConfig::new("my-chain", two_weeks), state)?;
//! verifier.verify(&signed_header, &validators, now)?;
//! ```

pub mod consensus;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types for convenience
pub use consensus::{
    config::{ConfigError, VerifierConfig},
    quorum::{QuorumError, ValidatorSet},
    trust_level::{InvalidTrustLevel, TrustLevel},
    trusted_state::{TrustedState, TrustedStateError},
    verifier::{Verifier, VerifyError},
};
pub use types::{block::*, hash::*, validator::*};
