//! # Error Module
//!
//! Error types for the cross-collection image matcher.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Only the collection roots are fatal** - file and pair failures are
//!   recovered by the engine and reported as outcomes

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum MatchFinderError {
    #[error("Collection error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to write report: {0}")]
    Report(#[from] std::io::Error),
}

impl MatchFinderError {
    /// Process exit code the CLI uses for this error.
    ///
    /// An unreadable collection root gets its own code so scripts can tell
    /// it apart from bad flags.
    pub fn exit_code(&self) -> u8 {
        match self {
            MatchFinderError::Corpus(CorpusError::PathUnreadable { .. }) => 2,
            _ => 1,
        }
    }
}

/// Errors that occur while enumerating a collection
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Cannot read collection {path}: {reason}")]
    PathUnreadable { path: PathBuf, reason: String },
}

/// Errors that occur while computing a content digest
#[derive(Error, Debug)]
pub enum DigestError {
    #[error("Cannot read file {path}: {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Digest of {path} skipped: run cancelled")]
    Cancelled { path: PathBuf },
}

impl DigestError {
    /// The file whose digest could not be computed
    pub fn path(&self) -> &PathBuf {
        match self {
            DigestError::FileUnreadable { path, .. } | DigestError::Cancelled { path } => path,
        }
    }
}

/// Errors that occur while scoring a pair of images
#[derive(Error, Debug)]
pub enum SimilarityError {
    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Failed to open image file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Similarity computation timed out after {limit:?}")]
    TimedOut { limit: Duration },

    #[error("Similarity computation failed: {0}")]
    Computation(String),
}

/// Errors in user-supplied settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid threshold: {value} (must be a number between -1 and 1)")]
    InvalidThreshold { value: f64 },

    #[error("Invalid worker count: {value} (must be at least 1)")]
    InvalidJobs { value: usize },

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(String),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, MatchFinderError>;
