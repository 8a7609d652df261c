//! # Similarity Module
//!
//! Perceptual similarity between two image files.
//!
//! ## How It Works
//! 1. Decode both files (zune-jpeg for JPEG, `image` for everything else)
//! 2. Convert to 8-bit grayscale
//! 3. Resize both to their common size if the dimensions differ
//! 4. Average the SSIM map computed over 11x11 Gaussian windows
//!
//! ## Score Interpretation
//! | SSIM        | Meaning                          |
//! |-------------|----------------------------------|
//! | 1.0         | Structurally identical           |
//! | 0.9 - 1.0   | Re-encoded / lightly edited copy |
//! | 0.7 - 0.9   | Likely the same picture          |
//! | below 0.7   | Different pictures               |
//!
//! The matcher only calls a provider for pairs whose digests differ.

mod decode;
mod resize;
mod ssim;
mod timeout;

pub use decode::FastDecoder;
pub use resize::FastResizer;
pub use ssim::{SsimComparator, SsimConfig};
pub use timeout::TimeoutSimilarity;

use crate::error::SimilarityError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Structural similarity of two images, in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SimilarityScore(f64);

impl SimilarityScore {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for SimilarityScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Scores a pair of image files
///
/// Implementations must be symmetric: `similarity(a, b) == similarity(b, a)`.
pub trait SimilarityProvider: Send + Sync {
    fn similarity(&self, a: &Path, b: &Path) -> Result<SimilarityScore, SimilarityError>;
}

impl<T: SimilarityProvider + ?Sized> SimilarityProvider for std::sync::Arc<T> {
    fn similarity(&self, a: &Path, b: &Path) -> Result<SimilarityScore, SimilarityError> {
        (**self).similarity(a, b)
    }
}
