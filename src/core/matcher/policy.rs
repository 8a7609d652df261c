//! Classification policy: threshold and failure handling.

use crate::core::similarity::SimilarityScore;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Lower bound a similarity score must strictly exceed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold(f64);

impl Threshold {
    /// Default cut-off for near-duplicates
    pub const DEFAULT: f64 = 0.7;

    /// Validate a threshold; SSIM lives in [-1, 1]
    pub fn new(value: f64) -> Result<Self, ConfigError> {
        if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
            return Err(ConfigError::InvalidThreshold { value });
        }
        Ok(Self(value))
    }

    /// Few false positives
    pub fn strict() -> Self {
        Self(0.9)
    }

    /// Catches heavier edits, more false positives
    pub fn permissive() -> Self {
        Self(0.5)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// `score > threshold`; a score equal to the threshold does not qualify
    pub fn is_exceeded_by(&self, score: SimilarityScore) -> bool {
        score.value() > self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// What to do with a pair whose image could not be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecodeFailurePolicy {
    /// Emit `ComparisonFailed` so corpus problems stay visible
    #[default]
    Report,
    /// Treat the pair as `Unrelated`
    Suppress,
}

/// Engine configuration
#[derive(Debug, Clone, Default)]
pub struct MatchConfig {
    pub threshold: Threshold,
    /// Emit `Unrelated` outcomes too (default: only findings and failures)
    pub report_unrelated: bool,
    pub decode_failures: DecodeFailurePolicy,
}

impl MatchConfig {
    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_unrelated(mut self, report: bool) -> Self {
        self.report_unrelated = report;
        self
    }

    pub fn with_decode_failures(mut self, policy: DecodeFailurePolicy) -> Self {
        self.decode_failures = policy;
        self
    }
}
