//! Deterministic keys, validator sets and signed headers for unit tests.

use crate::consensus::quorum::VOTE_SIGNATURE_DST;
use crate::types::*;
use blst::min_pk::SecretKey;
use chrono::{DateTime, Utc};

/// A validator set together with the secret keys of its members.
pub(crate) struct TestValidators {
    keys: Vec<SecretKey>,
    set: BlsValidatorSet,
}

impl TestValidators {
    /// Validators with consecutive seeds starting at `first_seed`.
    pub(crate) fn new(first_seed: u8, powers: &[u64]) -> Self {
        let entries: Vec<(u8, u64)> = powers
            .iter()
            .enumerate()
            .map(|(i, &power)| (first_seed + i as u8, power))
            .collect();
        Self::from_seeds(&entries)
    }

    /// Validators with explicit `(seed, power)` pairs. Equal seeds give equal keys,
    /// which lets two sets share members.
    pub(crate) fn from_seeds(entries: &[(u8, u64)]) -> Self {
        let keys: Vec<SecretKey> = entries.iter().map(|&(seed, _)| secret_key(seed)).collect();
        let validators = keys
            .iter()
            .zip(entries)
            .map(|(sk, &(_, power))| Validator::new(BlsPublicKey(sk.sk_to_pk().to_bytes()), power))
            .collect();
        let set = BlsValidatorSet::new(validators).unwrap();
        Self { keys, set }
    }

    pub(crate) fn set(&self) -> &BlsValidatorSet {
        &self.set
    }

    /// Build a commit where validator `i` signs iff `signers[i]`.
    pub(crate) fn sign_commit(
        &self,
        chain_id: &str,
        height: u64,
        block_id: Hash,
        signers: &[bool],
    ) -> Commit {
        let message = vote_sign_bytes(chain_id, height, 0, &block_id);
        let signatures = self
            .set
            .validators()
            .iter()
            .zip(&self.keys)
            .enumerate()
            .map(|(i, (validator, sk))| CommitSig {
                validator_address: validator.address,
                signature: signers.get(i).copied().unwrap_or(false).then(|| {
                    BlsSignature(sk.sign(&message.0, VOTE_SIGNATURE_DST, &[]).to_bytes())
                }),
            })
            .collect();

        Commit {
            height,
            round: 0,
            block_id,
            signatures,
        }
    }

    /// A header at `height` signed by this set, handing over to `next`.
    pub(crate) fn sign_header(
        &self,
        chain_id: &str,
        height: u64,
        time: DateTime<Utc>,
        next: &BlsValidatorSet,
        signers: &[bool],
    ) -> SignedHeader {
        let header = make_header(chain_id, height, time, &self.set, next);
        let commit = self.sign_commit(chain_id, height, header.hash(), signers);
        SignedHeader { header, commit }
    }
}

pub(crate) fn secret_key(seed: u8) -> SecretKey {
    SecretKey::key_gen(&[seed; 32], &[]).unwrap()
}

pub(crate) fn make_header(
    chain_id: &str,
    height: u64,
    time: DateTime<Utc>,
    vals: &BlsValidatorSet,
    next_vals: &BlsValidatorSet,
) -> Header {
    Header {
        chain_id: chain_id.to_string(),
        height,
        time,
        last_block_hash: sha256_hash(&height.saturating_sub(1).to_le_bytes()),
        validators_hash: vals.hash(),
        next_validators_hash: next_vals.hash(),
        app_hash: Hash([0xA0; 32]),
        proposer_address: vals.validators()[0].address,
    }
}

/// Unix timestamp in seconds to UTC time.
pub(crate) fn at(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
}
