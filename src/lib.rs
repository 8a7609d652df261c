//! # Image Crossmatch
//!
//! Finds images in one folder that also appear in another, either as
//! byte-identical copies or as visually near-identical versions.
//!
//! ## How Pairs Are Classified
//! - **Exact duplicate** - same MD5 digest
//! - **Near-duplicate** - different bytes, SSIM above the threshold (0.7)
//! - **Unrelated** - everything else (hidden unless asked for)
//! - **Comparison failed** - a file could not be read or decoded; the rest
//!   of the run is unaffected
//!
//! ## Architecture
//! - `core` - Collection listing, digests, similarity and the match engine
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//! - `signal` - Ctrl+C wiring for cancellation
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;
pub mod signal;

// Re-export commonly used types at the crate root
pub use error::{MatchFinderError, Result};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the application
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown, or debug
/// output with `verbose`. Logs go to stderr so they never mix with results.
/// Calling this more than once has no effect.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
