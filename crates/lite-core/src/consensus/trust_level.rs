use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Trust level {numerator}/{denominator} must lie in (0, 1]")]
pub struct InvalidTrustLevel {
    pub numerator: u64,
    pub denominator: u64,
}

/// Fraction of a validator set's voting power that must sign a commit.
///
/// Stored as an exact integer fraction so one third really is one third.
/// Always satisfies `0 < numerator <= denominator`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTrustLevel", into = "RawTrustLevel")]
pub struct TrustLevel {
    numerator: u64,
    denominator: u64,
}

#[derive(Serialize, Deserialize)]
struct RawTrustLevel {
    numerator: u64,
    denominator: u64,
}

impl TrustLevel {
    /// At least one correct validator signed, assuming fewer than a third are faulty.
    pub const ONE_THIRD: TrustLevel = TrustLevel {
        numerator: 1,
        denominator: 3,
    };

    /// Finality quorum.
    pub const TWO_THIRDS: TrustLevel = TrustLevel {
        numerator: 2,
        denominator: 3,
    };

    pub fn new(numerator: u64, denominator: u64) -> Result<Self, InvalidTrustLevel> {
        if numerator == 0 || denominator == 0 || numerator > denominator {
            return Err(InvalidTrustLevel {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// `signed / total >= numerator / denominator`, computed without division.
    pub fn is_enough_power(&self, signed: u64, total: u64) -> bool {
        (signed as u128) * (self.denominator as u128) >= (total as u128) * (self.numerator as u128)
    }

    /// Smallest signed power that satisfies this level for `total`.
    pub fn required_power(&self, total: u64) -> u64 {
        let needed = ((total as u128) * (self.numerator as u128)).div_ceil(self.denominator as u128);
        // numerator <= denominator, so needed <= total
        needed as u64
    }
}

impl Default for TrustLevel {
    fn default() -> Self {
        TrustLevel::ONE_THIRD
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl TryFrom<RawTrustLevel> for TrustLevel {
    type Error = InvalidTrustLevel;

    fn try_from(raw: RawTrustLevel) -> Result<Self, Self::Error> {
        TrustLevel::new(raw.numerator, raw.denominator)
    }
}

impl From<TrustLevel> for RawTrustLevel {
    fn from(level: TrustLevel) -> Self {
        RawTrustLevel {
            numerator: level.numerator,
            denominator: level.denominator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_is_exactly_one_third() {
        let level = TrustLevel::default();
        assert_eq!(level, TrustLevel::ONE_THIRD);
        assert_eq!((level.numerator(), level.denominator()), (1, 3));

        // Neither zero nor one
        assert!(!level.is_enough_power(0, 300));
        assert!(!level.is_enough_power(99, 300));
        assert!(level.is_enough_power(100, 300));
        assert_ne!(level, TrustLevel::new(1, 1).unwrap());
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(TrustLevel::new(0, 3).is_err());
        assert!(TrustLevel::new(1, 0).is_err());
        assert!(TrustLevel::new(4, 3).is_err());
        assert!(TrustLevel::new(1, 1).is_ok());
        assert!(TrustLevel::new(2, 3).is_ok());
    }

    #[test]
    fn test_two_thirds_boundary() {
        let level = TrustLevel::TWO_THIRDS;
        assert!(level.is_enough_power(200, 300));
        assert!(!level.is_enough_power(199, 300));
        assert_eq!(level.required_power(300), 200);
        assert_eq!(level.required_power(100), 67);
    }

    #[test]
    fn test_no_overflow_at_extremes() {
        let level = TrustLevel::new(u64::MAX - 1, u64::MAX).unwrap();
        assert!(level.is_enough_power(u64::MAX, u64::MAX));
        assert!(!level.is_enough_power(u64::MAX / 2, u64::MAX));
    }

    #[test]
    fn test_deserialize_validates() {
        let parsed: TrustLevel = serde_json::from_str(r#"{"numerator":2,"denominator":3}"#).unwrap();
        assert_eq!(parsed, TrustLevel::TWO_THIRDS);

        assert!(serde_json::from_str::<TrustLevel>(r#"{"numerator":0,"denominator":3}"#).is_err());
        assert!(serde_json::from_str::<TrustLevel>(r#"{"numerator":5,"denominator":3}"#).is_err());
    }

    proptest! {
        #[test]
        fn required_power_is_the_threshold(
            numerator in 1u64..1_000,
            extra in 0u64..1_000,
            total in 1u64..1_000_000_000,
        ) {
            let level = TrustLevel::new(numerator, numerator + extra).unwrap();
            let required = level.required_power(total);
            prop_assert!(required <= total);
            prop_assert!(level.is_enough_power(required, total));
            prop_assert!(required == 0 || !level.is_enough_power(required - 1, total));
        }

        #[test]
        fn raising_the_level_never_admits_more(
            signed in 0u64..1_000_000,
            total in 1u64..1_000_000,
        ) {
            let accepted_high = TrustLevel::TWO_THIRDS.is_enough_power(signed, total);
            let accepted_low = TrustLevel::ONE_THIRD.is_enough_power(signed, total);
            prop_assert!(!accepted_high || accepted_low);
        }
    }
}
