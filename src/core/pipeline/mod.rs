//! # Pipeline Module
//!
//! Orchestrates a full cross-collection match.
//!
//! ## Pipeline Stages
//! 1. **Load** - List the regular files directly under both collection roots
//! 2. **Digest** - MD5 every file once, in parallel
//! 3. **Compare** - Classify every `(a, b)` pair of the cross product
//!
//! ## Parallelism
//! Uses rayon for both the digest phase and the pair pass. With `jobs` set,
//! both run on a dedicated pool of that size instead of the global one.

mod executor;

pub use crate::core::matcher::CancellationToken;
pub use executor::{Pipeline, PipelineBuilder, PipelineConfig, PipelineResult};
