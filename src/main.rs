//! # image-match CLI
//!
//! Command-line interface for the cross-collection image matcher.
//!
//! ## Usage
//! ```bash
//! image-match ~/Photos/old ~/Photos/new
//! image-match ~/Photos/old ~/Photos/new --threshold 0.9 --output json
//! ```

mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
