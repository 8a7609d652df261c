//! # Core Module
//!
//! The matching engine, independent of any front end.
//!
//! ## Modules
//! - `corpus` - Lists the files of a collection root
//! - `digest` - MD5 content digests for exact duplicates
//! - `similarity` - SSIM scores for near-duplicates
//! - `matcher` - Classifies every cross-collection pair
//! - `pipeline` - Orchestrates the full workflow
//! - `reporter` - Renders and exports outcomes

pub mod corpus;
pub mod digest;
pub mod matcher;
pub mod pipeline;
pub mod reporter;
pub mod similarity;

// Re-export commonly used types
pub use corpus::{Collection, Corpus, FileRef};
pub use digest::Digest;
pub use matcher::{MatchKind, MatchOutcome, MatchReport};
pub use similarity::SimilarityScore;
