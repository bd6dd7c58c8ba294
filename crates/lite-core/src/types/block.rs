use crate::types::hash::{merkle_root, sha256_hash, Address, Hash};
use crate::types::validator::BlsSignature;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length in bytes of a chain identifier.
pub const MAX_CHAIN_ID_LEN: usize = 50;

/// Domain tag prepended to every vote before it is hashed and signed.
const VOTE_DOMAIN_TAG: &[u8] = b"lite/vote/v1";

/// Reasons a signed header fails its self-consistency checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("Header belongs to chain {got:?}, expected {expected:?}")]
    ChainIdMismatch { expected: String, got: String },

    #[error("Header chain id is empty")]
    EmptyChainId,

    #[error("Header chain id is {len} bytes long (max {max})")]
    ChainIdTooLong { len: usize, max: usize },

    #[error("Header height must be greater than zero")]
    ZeroHeight,

    #[error("Commit height {commit_height} does not match header height {header_height}")]
    CommitHeightMismatch {
        header_height: u64,
        commit_height: u64,
    },

    #[error("Commit signs block {commit_block_id}, but header hashes to {header_hash}")]
    CommitBlockMismatch {
        header_hash: Hash,
        commit_block_id: Hash,
    },

    #[error("Commit carries no signatures")]
    EmptyCommit,
}

/// A block header claim.
/// Carries the hashes of the validator sets that sign this block and the next one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Identifier of the chain this block belongs to.
    pub chain_id: String,
    /// Height of this block.
    pub height: u64,
    /// Block time as proposed by the chain.
    pub time: DateTime<Utc>,
    /// Hash of the previous block.
    pub last_block_hash: Hash,
    /// Hash of the validator set that signs this block.
    pub validators_hash: Hash,
    /// Hash of the validator set that signs the next block.
    pub next_validators_hash: Hash,
    /// Application state root after the previous block.
    pub app_hash: Hash,
    /// Address of the validator that proposed this block.
    pub proposer_address: Address,
}

impl Header {
    /// Compute the block hash: the Merkle root of the encoded header fields.
    pub fn hash(&self) -> Hash {
        let mut time_bytes = [0u8; 12];
        time_bytes[..8].copy_from_slice(&self.time.timestamp().to_le_bytes());
        time_bytes[8..].copy_from_slice(&self.time.timestamp_subsec_nanos().to_le_bytes());

        let leaves = [
            sha256_hash(self.chain_id.as_bytes()),
            sha256_hash(&self.height.to_le_bytes()),
            sha256_hash(&time_bytes),
            sha256_hash(&self.last_block_hash.0),
            sha256_hash(&self.validators_hash.0),
            sha256_hash(&self.next_validators_hash.0),
            sha256_hash(&self.app_hash.0),
            sha256_hash(&self.proposer_address.0),
        ];

        merkle_root(&leaves)
    }

    /// Structural checks that need no outside context.
    pub fn validate_basic(&self) -> Result<(), HeaderError> {
        if self.chain_id.is_empty() {
            return Err(HeaderError::EmptyChainId);
        }
        if self.chain_id.len() > MAX_CHAIN_ID_LEN {
            return Err(HeaderError::ChainIdTooLong {
                len: self.chain_id.len(),
                max: MAX_CHAIN_ID_LEN,
            });
        }
        if self.height == 0 {
            return Err(HeaderError::ZeroHeight);
        }
        Ok(())
    }
}

/// One slot of a commit, aligned with a validator.
/// `signature` is `None` when the validator did not vote for the block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSig {
    pub validator_address: Address,
    pub signature: Option<BlsSignature>,
}

impl CommitSig {
    pub fn absent(validator_address: Address) -> Self {
        Self {
            validator_address,
            signature: None,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.signature.is_none()
    }
}

/// The evidence that validators signed a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub height: u64,
    pub round: u32,
    /// Hash of the block the signatures vote for.
    pub block_id: Hash,
    pub signatures: Vec<CommitSig>,
}

impl Commit {
    /// The message every validator in this commit signed.
    pub fn sign_bytes(&self, chain_id: &str) -> Hash {
        vote_sign_bytes(chain_id, self.height, self.round, &self.block_id)
    }
}

/// Canonical digest of a precommit vote.
///
/// The chain id is length-prefixed so no two (chain id, height) pairs can
/// produce the same preimage.
pub fn vote_sign_bytes(chain_id: &str, height: u64, round: u32, block_id: &Hash) -> Hash {
    let mut data = Vec::with_capacity(VOTE_DOMAIN_TAG.len() + 8 + chain_id.len() + 8 + 4 + 32);
    data.extend_from_slice(VOTE_DOMAIN_TAG);
    data.extend_from_slice(&(chain_id.len() as u64).to_le_bytes());
    data.extend_from_slice(chain_id.as_bytes());
    data.extend_from_slice(&height.to_le_bytes());
    data.extend_from_slice(&round.to_le_bytes());
    data.extend_from_slice(&block_id.0);
    sha256_hash(&data)
}

/// A header together with the commit that signs it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedHeader {
    pub header: Header,
    pub commit: Commit,
}

impl SignedHeader {
    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.header.time
    }

    /// Check the header is well formed, belongs to `chain_id` and that the
    /// commit is for this exact header.
    pub fn validate_basic(&self, chain_id: &str) -> Result<(), HeaderError> {
        if self.header.chain_id != chain_id {
            return Err(HeaderError::ChainIdMismatch {
                expected: chain_id.to_string(),
                got: self.header.chain_id.clone(),
            });
        }

        self.header.validate_basic()?;

        if self.commit.height != self.header.height {
            return Err(HeaderError::CommitHeightMismatch {
                header_height: self.header.height,
                commit_height: self.commit.height,
            });
        }

        let header_hash = self.header.hash();
        if self.commit.block_id != header_hash {
            return Err(HeaderError::CommitBlockMismatch {
                header_hash,
                commit_block_id: self.commit.block_id,
            });
        }

        if self.commit.signatures.is_empty() {
            return Err(HeaderError::EmptyCommit);
        }

        Ok(())
    }
}
