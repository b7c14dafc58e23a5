//! Validator set and quorum arithmetic
//!
//! Voting power comes from replicated state only. Sets are stored in ordered
//! maps so iteration is identical on every validator.

use crate::error::{AttestError, AttestResult};
use shared_types::{PublicKey, ValidatorId, ValidatorSpec};
use std::collections::BTreeMap;

/// Validator with voting power and signing key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validator {
    pub id: ValidatorId,
    pub power: u64,
    pub public_key: PublicKey,
}

/// Stake-weighted validator set attesting to one chain
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidatorSet {
    validators: BTreeMap<ValidatorId, Validator>,
    total_power: u128,
}

impl ValidatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from network-file entries.
    pub fn from_specs(specs: &[ValidatorSpec]) -> Self {
        let mut set = Self::new();
        for spec in specs {
            set.add_validator(spec.public_key, spec.power);
        }
        set
    }

    /// Add or replace a validator; its id is derived from the key.
    pub fn add_validator(&mut self, public_key: PublicKey, power: u64) -> ValidatorId {
        let id = ValidatorId::from_public_key(&public_key);
        let validator = Validator {
            id,
            power,
            public_key,
        };
        if let Some(previous) = self.validators.insert(id, validator) {
            self.total_power -= u128::from(previous.power);
        }
        self.total_power += u128::from(power);
        id
    }

    pub fn get(&self, id: &ValidatorId) -> Option<&Validator> {
        self.validators.get(id)
    }

    /// Voting power of `id`, zero when absent.
    pub fn power_of(&self, id: &ValidatorId) -> u64 {
        self.validators.get(id).map(|v| v.power).unwrap_or(0)
    }

    pub fn contains(&self, id: &ValidatorId) -> bool {
        self.validators.contains_key(id)
    }

    pub fn total_power(&self) -> u128 {
        self.total_power
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Validators in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Validator> {
        self.validators.values()
    }
}

/// Quorum as a fraction of total voting power.
///
/// A candidate is approved once its weight reaches
/// `ceil(total * numerator / denominator)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuorumThreshold {
    pub numerator: u64,
    pub denominator: u64,
}

impl QuorumThreshold {
    pub const TWO_THIRDS: QuorumThreshold = QuorumThreshold {
        numerator: 2,
        denominator: 3,
    };

    pub fn new(numerator: u64, denominator: u64) -> AttestResult<Self> {
        let threshold = Self {
            numerator,
            denominator,
        };
        threshold.validate()?;
        Ok(threshold)
    }

    /// Fraction must lie in (0, 1].
    pub fn validate(&self) -> AttestResult<()> {
        if self.denominator == 0 || self.numerator == 0 || self.numerator > self.denominator {
            return Err(AttestError::InvalidConfig(format!(
                "quorum must be in (0, 1], got {}/{}",
                self.numerator, self.denominator
            )));
        }
        Ok(())
    }

    /// Minimum weight needed out of `total`.
    ///
    /// Computed as `q * num + ceil(r * num / den)` with `total = q * den + r`,
    /// which cannot overflow for a fraction at most one.
    pub fn required_power(&self, total: u128) -> u128 {
        let num = u128::from(self.numerator);
        let den = u128::from(self.denominator);
        let whole = (total / den) * num;
        let rem = (total % den) * num;
        whole + rem.div_ceil(den)
    }

    /// True if `power` out of `total` meets the threshold.
    pub fn is_met(&self, power: u128, total: u128) -> bool {
        total > 0 && power >= self.required_power(total)
    }
}

impl Default for QuorumThreshold {
    fn default() -> Self {
        Self::TWO_THIRDS
    }
}
