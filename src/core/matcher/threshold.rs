//! Match threshold.

use crate::core::hasher::Fingerprint;
use crate::error::MatchError;
use serde::{Deserialize, Serialize};

/// Validated maximum Hamming distance for a match.
///
/// A 64-bit fingerprint can differ in at most 64 bits, so anything above
/// that would accept every candidate and is rejected as a configuration
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ThresholdStrategy {
    max_distance: u32,
}

impl ThresholdStrategy {
    /// Distance used when none is configured
    pub const DEFAULT_MAX_DISTANCE: u32 = 3;

    pub fn new(max_distance: u32) -> Result<Self, MatchError> {
        if max_distance > Fingerprint::BITS {
            return Err(MatchError::InvalidThreshold {
                value: max_distance,
            });
        }
        Ok(Self { max_distance })
    }

    pub fn max_distance(&self) -> u32 {
        self.max_distance
    }

    /// True when `distance` is within the threshold (inclusive)
    pub fn accepts(&self, distance: u32) -> bool {
        distance <= self.max_distance
    }
}

impl Default for ThresholdStrategy {
    fn default() -> Self {
        Self {
            max_distance: Self::DEFAULT_MAX_DISTANCE,
        }
    }
}

impl TryFrom<u32> for ThresholdStrategy {
    type Error = MatchError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ThresholdStrategy> for u32 {
    fn from(strategy: ThresholdStrategy) -> Self {
        strategy.max_distance
    }
}
