//! Event type definitions for progress reporting.

use crate::core::corpus::Collection;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the matching pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Collection loading events
    Corpus(CorpusEvent),
    /// Digest phase events
    Digest(DigestEvent),
    /// Pairwise comparison events
    Compare(CompareEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events while enumerating a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CorpusEvent {
    /// Started listing a collection root
    Started { collection: Collection, root: PathBuf },
    /// An entry was skipped because it could not be inspected
    Skipped { path: PathBuf, message: String },
    /// Collection listed
    Loaded { collection: Collection, files: usize },
}

/// Events during the digest phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DigestEvent {
    /// Digesting has started
    Started { total_files: usize },
    /// A file was digested (or failed)
    Progress(DigestProgress),
    /// A file could not be read; all pairs involving it will fail
    Error { path: PathBuf, message: String },
    /// Digesting completed
    Completed { digested: usize, failed: usize },
}

/// Progress information during digesting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestProgress {
    /// Files processed so far
    pub completed: usize,
    /// Total files across both collections
    pub total: usize,
    /// File just processed
    pub current_path: PathBuf,
}

/// Events during the pairwise pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompareEvent {
    /// Comparison has started
    Started { total_pairs: usize },
    /// Progress update during comparison
    Progress(CompareProgress),
    /// Comparison finished (possibly early, if cancelled)
    Completed {
        pairs_evaluated: usize,
        matches_found: usize,
        failures: usize,
    },
}

/// Progress information during comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareProgress {
    /// Number of pairs evaluated
    pub pairs_completed: usize,
    /// Total number of pairs in the cross product
    pub total_pairs: usize,
    /// Exact and near duplicates so far
    pub matches_found: usize,
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed
    Completed { summary: PipelineSummary },
    /// Pipeline was cancelled between pairs
    Cancelled,
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Loading,
    Digesting,
    Comparing,
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub files_a: usize,
    pub files_b: usize,
    pub exact_duplicates: usize,
    pub near_duplicates: usize,
    pub failed_pairs: usize,
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Loading => write!(f, "Loading"),
            PipelinePhase::Digesting => write!(f, "Digesting"),
            PipelinePhase::Comparing => write!(f, "Comparing"),
        }
    }
}
