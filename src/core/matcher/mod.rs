//! # Matcher Module
//!
//! Decides, for every pair in the cross product of two corpora, whether the
//! pair is an exact duplicate, a near-duplicate, unrelated, or could not be
//! compared.
//!
//! ## How It Works
//! 1. Digest every file once (`DigestTable`), `n + m` digest computations
//! 2. For each pair `(a, b)`:
//!    - equal digests: `ExactDuplicate`, similarity is never computed
//!    - otherwise score with the similarity provider:
//!      `score > threshold` gives `NearDuplicate`, anything else `Unrelated`
//! 3. Digest, read and decode failures become `ComparisonFailed` for the
//!    affected pairs only; the run continues
//!
//! ## Outcomes
//! | Variant            | Emitted by default |
//! |--------------------|--------------------|
//! | `ExactDuplicate`   | yes                |
//! | `NearDuplicate`    | yes                |
//! | `ComparisonFailed` | yes                |
//! | `Unrelated`        | only with `report_unrelated` |

mod cancel;
mod engine;
mod policy;

pub use cancel::CancellationToken;
pub use engine::{MatchEngine, MatchReport, MatchStats, PreparedMatch};
pub use policy::{DecodeFailurePolicy, MatchConfig, Threshold};

use crate::core::corpus::FileRef;
use crate::core::digest::Digest;
use crate::core::similarity::SimilarityScore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of evaluating one cross-collection pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Byte-identical content
    ExactDuplicate {
        a: FileRef,
        b: FileRef,
        digest: Digest,
    },
    /// Different bytes, similarity above the threshold
    NearDuplicate {
        a: FileRef,
        b: FileRef,
        score: SimilarityScore,
    },
    /// Neither; `score` is absent when a decode failure was suppressed
    Unrelated {
        a: FileRef,
        b: FileRef,
        score: Option<SimilarityScore>,
    },
    /// The pair could not be evaluated
    ComparisonFailed {
        a: FileRef,
        b: FileRef,
        failure: PairFailure,
    },
}

impl MatchOutcome {
    pub fn kind(&self) -> MatchKind {
        match self {
            MatchOutcome::ExactDuplicate { .. } => MatchKind::Exact,
            MatchOutcome::NearDuplicate { .. } => MatchKind::Near,
            MatchOutcome::Unrelated { .. } => MatchKind::Unrelated,
            MatchOutcome::ComparisonFailed { .. } => MatchKind::Failed,
        }
    }

    /// The pair this outcome is about, collection A first
    pub fn pair(&self) -> (&FileRef, &FileRef) {
        match self {
            MatchOutcome::ExactDuplicate { a, b, .. }
            | MatchOutcome::NearDuplicate { a, b, .. }
            | MatchOutcome::Unrelated { a, b, .. }
            | MatchOutcome::ComparisonFailed { a, b, .. } => (a, b),
        }
    }

    /// Similarity score, if one was computed
    pub fn score(&self) -> Option<SimilarityScore> {
        match self {
            MatchOutcome::NearDuplicate { score, .. } => Some(*score),
            MatchOutcome::Unrelated { score, .. } => *score,
            _ => None,
        }
    }

    /// Exact or near duplicate
    pub fn is_match(&self) -> bool {
        self.kind().is_match()
    }
}

/// Outcome category without the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    Exact,
    Near,
    Unrelated,
    Failed,
}

impl MatchKind {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchKind::Exact | MatchKind::Near)
    }
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::Exact => write!(f, "exact"),
            MatchKind::Near => write!(f, "near"),
            MatchKind::Unrelated => write!(f, "unrelated"),
            MatchKind::Failed => write!(f, "failed"),
        }
    }
}

/// Why a pair could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairFailure {
    /// File that caused the failure, when one file is to blame
    pub path: Option<PathBuf>,
    pub stage: FailureStage,
    pub reason: String,
}

/// Where in the evaluation a pair failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// File could not be read for digesting
    Digest,
    /// File is not a decodable image
    Decode,
    /// Read or computation error while scoring
    Similarity,
    /// Scoring exceeded the caller's time limit
    Timeout,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureStage::Digest => write!(f, "digest"),
            FailureStage::Decode => write!(f, "decode"),
            FailureStage::Similarity => write!(f, "similarity"),
            FailureStage::Timeout => write!(f, "timeout"),
        }
    }
}
