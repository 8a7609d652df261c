//! Ctrl+C handling.
//!
//! The handler only flips the pipeline's `CancellationToken`; pairs already
//! being scored finish, no new pair starts, and the CLI exits with
//! `EXIT_CODE_INTERRUPTED` once the partial report is printed.

use crate::core::matcher::CancellationToken;
use std::io::Write;
use std::sync::atomic::Ordering;

/// Exit code after an interrupt (128 + SIGINT)
pub const EXIT_CODE_INTERRUPTED: u8 = 130;

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

/// Cancel `token` when the process receives Ctrl+C (or SIGTERM).
///
/// Can only succeed once per process.
pub fn install_handler(token: &CancellationToken) -> Result<(), SignalError> {
    let flag = token.flag();

    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);

        let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing pairs in progress...");
        let _ = std::io::stderr().flush();

        tracing::info!("shutdown signal received");
    })?;

    Ok(())
}
