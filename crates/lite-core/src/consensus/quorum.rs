use crate::consensus::trust_level::TrustLevel;
use crate::types::{Address, BlsPublicKey, BlsSignature, BlsValidatorSet, Commit, Hash};
use std::collections::HashSet;
use thiserror::Error;
use tracing::trace;

/// Domain separation tag for vote signatures (BLS12-381, min-pk, basic scheme).
pub const VOTE_SIGNATURE_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_";

/// Reasons a commit fails to carry a quorum from a validator set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuorumError {
    #[error("Commit is for height {got}, expected {expected}")]
    WrongHeight { expected: u64, got: u64 },

    #[error("Commit is for block {got}, expected {expected}")]
    WrongBlockId { expected: Hash, got: Hash },

    #[error("Commit has {signatures} signature slots for {validators} validators")]
    SignatureCountMismatch { validators: usize, signatures: usize },

    #[error("Signature slot {index} belongs to {got}, expected validator {expected}")]
    ValidatorAddressMismatch {
        index: usize,
        expected: Address,
        got: Address,
    },

    #[error("Validator {address} voted more than once")]
    DuplicateVote { address: Address },

    #[error("Invalid BLS public key for validator {address}: {reason}")]
    InvalidPublicKey { address: Address, reason: String },

    #[error("Invalid signature in slot {index} from validator {address}: {reason}")]
    InvalidSignature {
        index: usize,
        address: Address,
        reason: String,
    },

    #[error("Insufficient voting power: {signed}/{total} signed (need {required} = {level})")]
    NotEnoughVotingPower {
        signed: u64,
        total: u64,
        required: u64,
        level: TrustLevel,
    },
}

/// The validator set capability the verifier relies on.
///
/// Implementations own the signature scheme and the voting power accounting;
/// the verifier only compares hashes and asks for quorums.
pub trait ValidatorSet {
    /// Canonical hash binding this set to the headers it signs.
    fn hash(&self) -> Hash;

    /// Check that at least 2/3 of this set's voting power signed `commit`
    /// for `block_id` at `height`.
    fn verify_commit(
        &self,
        chain_id: &str,
        block_id: &Hash,
        height: u64,
        commit: &Commit,
    ) -> Result<(), QuorumError>;

    /// Check that at least `trust_level` of this set's voting power signed
    /// `commit`, even though the commit may come from a different set.
    fn verify_commit_trusting(
        &self,
        chain_id: &str,
        block_id: &Hash,
        height: u64,
        commit: &Commit,
        trust_level: TrustLevel,
    ) -> Result<(), QuorumError>;
}

impl ValidatorSet for BlsValidatorSet {
    fn hash(&self) -> Hash {
        BlsValidatorSet::hash(self)
    }

    fn verify_commit(
        &self,
        chain_id: &str,
        block_id: &Hash,
        height: u64,
        commit: &Commit,
    ) -> Result<(), QuorumError> {
        check_commit_target(block_id, height, commit)?;

        if commit.signatures.len() != self.len() {
            return Err(QuorumError::SignatureCountMismatch {
                validators: self.len(),
                signatures: commit.signatures.len(),
            });
        }

        let message = commit.sign_bytes(chain_id);
        let mut signed: u64 = 0;

        for (index, (validator, sig)) in self.validators().iter().zip(&commit.signatures).enumerate() {
            if sig.validator_address != validator.address {
                return Err(QuorumError::ValidatorAddressMismatch {
                    index,
                    expected: validator.address,
                    got: sig.validator_address,
                });
            }

            let Some(signature) = &sig.signature else {
                continue;
            };

            verify_vote_signature(index, validator.address, &validator.pub_key, &message, signature)?;
            // Total power is bounded at construction, so this cannot overflow.
            signed += validator.voting_power;
        }

        check_power(signed, self.total_voting_power(), TrustLevel::TWO_THIRDS)
    }

    fn verify_commit_trusting(
        &self,
        chain_id: &str,
        block_id: &Hash,
        height: u64,
        commit: &Commit,
        trust_level: TrustLevel,
    ) -> Result<(), QuorumError> {
        check_commit_target(block_id, height, commit)?;

        let message = commit.sign_bytes(chain_id);
        let mut seen: HashSet<Address> = HashSet::new();
        let mut signed: u64 = 0;

        for (index, sig) in commit.signatures.iter().enumerate() {
            let Some(signature) = &sig.signature else {
                continue;
            };

            // Votes from validators outside this set carry no weight here.
            let Some(validator) = self.get_by_address(&sig.validator_address) else {
                continue;
            };

            if !seen.insert(validator.address) {
                return Err(QuorumError::DuplicateVote {
                    address: validator.address,
                });
            }

            verify_vote_signature(index, validator.address, &validator.pub_key, &message, signature)?;
            signed += validator.voting_power;

            // Stop verifying signatures once the threshold is met.
            if trust_level.is_enough_power(signed, self.total_voting_power()) {
                trace!(signed, total = self.total_voting_power(), %trust_level, "trust level reached");
                return Ok(());
            }
        }

        check_power(signed, self.total_voting_power(), trust_level)
    }
}

fn check_commit_target(block_id: &Hash, height: u64, commit: &Commit) -> Result<(), QuorumError> {
    if commit.height != height {
        return Err(QuorumError::WrongHeight {
            expected: height,
            got: commit.height,
        });
    }
    if &commit.block_id != block_id {
        return Err(QuorumError::WrongBlockId {
            expected: *block_id,
            got: commit.block_id,
        });
    }
    Ok(())
}

fn check_power(signed: u64, total: u64, level: TrustLevel) -> Result<(), QuorumError> {
    if !level.is_enough_power(signed, total) {
        return Err(QuorumError::NotEnoughVotingPower {
            signed,
            total,
            required: level.required_power(total),
            level,
        });
    }
    trace!(signed, total, %level, "quorum reached");
    Ok(())
}

/// Verify a single BLS12-381 vote signature.
/// Uses the blst library for the actual cryptographic verification.
fn verify_vote_signature(
    index: usize,
    address: Address,
    pub_key: &BlsPublicKey,
    message: &Hash,
    signature: &BlsSignature,
) -> Result<(), QuorumError> {
    use blst::min_pk::{PublicKey, Signature};
    use blst::BLST_ERROR;

    let pk = PublicKey::from_bytes(&pub_key.0).map_err(|e| QuorumError::InvalidPublicKey {
        address,
        reason: format!("{:?}", e),
    })?;

    let sig = Signature::from_bytes(&signature.0).map_err(|e| QuorumError::InvalidSignature {
        index,
        address,
        reason: format!("Failed to deserialize signature: {:?}", e),
    })?;

    let result = sig.verify(true, &message.0, VOTE_SIGNATURE_DST, &[], &pk, true);
    if result != BLST_ERROR::BLST_SUCCESS {
        return Err(QuorumError::InvalidSignature {
            index,
            address,
            reason: format!("{:?}", result),
        });
    }

    Ok(())
}
