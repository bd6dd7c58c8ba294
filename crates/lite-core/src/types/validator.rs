use crate::types::hash::{impl_hex_bytes, merkle_root, sha256_hash, Address, Hash};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Number of bytes in a BLS12-381 public key (compressed).
pub const BLS_PUBKEY_LEN: usize = 48;

/// Number of bytes in a BLS12-381 signature (compressed).
pub const BLS_SIGNATURE_LEN: usize = 96;

/// Upper bound on the summed voting power of a set, leaving headroom for
/// threshold arithmetic.
pub const MAX_TOTAL_VOTING_POWER: u64 = (i64::MAX / 8) as u64;

/// A BLS12-381 public key (48 bytes, compressed G1 point).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsPublicKey(pub [u8; BLS_PUBKEY_LEN]);

impl_hex_bytes!(BlsPublicKey, BLS_PUBKEY_LEN, "BLS public key");

/// A BLS12-381 signature (96 bytes, compressed G2 point).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsSignature(pub [u8; BLS_SIGNATURE_LEN]);

impl_hex_bytes!(BlsSignature, BLS_SIGNATURE_LEN, "BLS signature");

/// Errors raised while assembling a validator set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorSetError {
    #[error("Validator set is empty")]
    Empty,

    #[error("Validator {address} has zero voting power")]
    ZeroVotingPower { address: Address },

    #[error("Validator address {address} does not match its public key (expected {expected})")]
    AddressMismatch { address: Address, expected: Address },

    #[error("Validator {address} appears more than once")]
    DuplicateValidator { address: Address },

    #[error("Total voting power exceeds the maximum of {max}")]
    TotalVotingPowerOverflow { max: u64 },
}

/// A member of a validator set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Derived from `pub_key`; kept alongside it so commits can reference it.
    pub address: Address,
    pub pub_key: BlsPublicKey,
    pub voting_power: u64,
}

impl Validator {
    pub fn new(pub_key: BlsPublicKey, voting_power: u64) -> Self {
        Self {
            address: Address::from_pub_key_bytes(&pub_key.0),
            pub_key,
            voting_power,
        }
    }

    /// Leaf committed to by the validator set hash.
    fn hash_leaf(&self) -> Hash {
        let mut data = [0u8; BLS_PUBKEY_LEN + 8];
        data[..BLS_PUBKEY_LEN].copy_from_slice(&self.pub_key.0);
        data[BLS_PUBKEY_LEN..].copy_from_slice(&self.voting_power.to_le_bytes());
        sha256_hash(&data)
    }
}

/// An ordered set of validators whose votes are verified with BLS12-381.
///
/// Order is significant: it fixes the set hash and the slot each validator
/// occupies in a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Validator>", into = "Vec<Validator>")]
pub struct BlsValidatorSet {
    validators: Vec<Validator>,
    total_voting_power: u64,
}

impl BlsValidatorSet {
    pub fn new(validators: Vec<Validator>) -> Result<Self, ValidatorSetError> {
        if validators.is_empty() {
            return Err(ValidatorSetError::Empty);
        }

        let mut seen = HashSet::with_capacity(validators.len());
        let mut total: u64 = 0;

        for validator in &validators {
            let expected = Address::from_pub_key_bytes(&validator.pub_key.0);
            if validator.address != expected {
                return Err(ValidatorSetError::AddressMismatch {
                    address: validator.address,
                    expected,
                });
            }
            if validator.voting_power == 0 {
                return Err(ValidatorSetError::ZeroVotingPower {
                    address: validator.address,
                });
            }
            if !seen.insert(validator.address) {
                return Err(ValidatorSetError::DuplicateValidator {
                    address: validator.address,
                });
            }

            total = total
                .checked_add(validator.voting_power)
                .filter(|t| *t <= MAX_TOTAL_VOTING_POWER)
                .ok_or(ValidatorSetError::TotalVotingPowerOverflow {
                    max: MAX_TOTAL_VOTING_POWER,
                })?;
        }

        Ok(Self {
            validators,
            total_voting_power: total,
        })
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn total_voting_power(&self) -> u64 {
        self.total_voting_power
    }

    /// Look up a validator by address.
    pub fn get_by_address(&self, address: &Address) -> Option<&Validator> {
        self.validators.iter().find(|v| &v.address == address)
    }

    /// Merkle root over the validators in set order.
    pub fn hash(&self) -> Hash {
        let leaves: Vec<Hash> = self.validators.iter().map(Validator::hash_leaf).collect();
        merkle_root(&leaves)
    }
}

impl TryFrom<Vec<Validator>> for BlsValidatorSet {
    type Error = ValidatorSetError;

    fn try_from(validators: Vec<Validator>) -> Result<Self, Self::Error> {
        Self::new(validators)
    }
}

impl From<BlsValidatorSet> for Vec<Validator> {
    fn from(set: BlsValidatorSet) -> Self {
        set.validators
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_validator(seed: u8, power: u64) -> Validator {
        Validator::new(BlsPublicKey([seed; BLS_PUBKEY_LEN]), power)
    }

    #[test]
    fn test_validator_set_totals_power() {
        let set = BlsValidatorSet::new(vec![make_validator(1, 10), make_validator(2, 25)]).unwrap();
        assert_eq!(set.total_voting_power(), 35);
        assert_eq!(set.len(), 2);
        assert!(set.get_by_address(&set.validators()[1].address).is_some());
        assert!(set.get_by_address(&Address([0; 20])).is_none());
    }

    #[test]
    fn test_validator_set_rejects_empty() {
        assert_eq!(BlsValidatorSet::new(vec![]), Err(ValidatorSetError::Empty));
    }

    #[test]
    fn test_validator_set_rejects_zero_power() {
        let result = BlsValidatorSet::new(vec![make_validator(1, 10), make_validator(2, 0)]);
        assert!(matches!(result, Err(ValidatorSetError::ZeroVotingPower { .. })));
    }

    #[test]
    fn test_validator_set_rejects_duplicates() {
        let result = BlsValidatorSet::new(vec![make_validator(1, 10), make_validator(1, 5)]);
        assert!(matches!(result, Err(ValidatorSetError::DuplicateValidator { .. })));
    }

    #[test]
    fn test_validator_set_rejects_forged_address() {
        let mut forged = make_validator(1, 10);
        forged.address = Address([0xFF; 20]);
        let result = BlsValidatorSet::new(vec![forged]);
        assert!(matches!(result, Err(ValidatorSetError::AddressMismatch { .. })));
    }

    #[test]
    fn test_validator_set_rejects_power_overflow() {
        let result = BlsValidatorSet::new(vec![
            make_validator(1, MAX_TOTAL_VOTING_POWER),
            make_validator(2, 1),
        ]);
        assert!(matches!(
            result,
            Err(ValidatorSetError::TotalVotingPowerOverflow { .. })
        ));
    }

    #[test]
    fn test_validator_set_hash_depends_on_power_and_order() {
        let a = make_validator(1, 10);
        let b = make_validator(2, 20);

        let set = BlsValidatorSet::new(vec![a.clone(), b.clone()]).unwrap();
        let reordered = BlsValidatorSet::new(vec![b.clone(), a.clone()]).unwrap();
        let reweighted = BlsValidatorSet::new(vec![a, make_validator(2, 21)]).unwrap();

        assert_ne!(set.hash(), reordered.hash());
        assert_ne!(set.hash(), reweighted.hash());
        assert_eq!(set.hash(), set.clone().hash());
    }

    #[test]
    fn test_validator_set_deserialize_validates() {
        let set = BlsValidatorSet::new(vec![make_validator(1, 10)]).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        let parsed: BlsValidatorSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, set);
        assert_eq!(parsed.total_voting_power(), 10);

        let zero_power = json.replace("\"voting_power\":10", "\"voting_power\":0");
        assert!(serde_json::from_str::<BlsValidatorSet>(&zero_power).is_err());
    }
}
