//! Per-call time limit for a similarity provider.

use super::{SimilarityProvider, SimilarityScore};
use crate::error::SimilarityError;
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Wraps a provider and gives up on calls that exceed `limit`.
///
/// Each call runs on its own helper thread. A timed-out computation is
/// abandoned, not interrupted: its thread keeps decoding in the background
/// until the inner provider returns, and the result is discarded. Helpers are
/// not pooled, so a corpus with many pathological files can hold one thread
/// per timed-out pair at once. `helpers_running` reports how many are alive.
pub struct TimeoutSimilarity {
    inner: Arc<dyn SimilarityProvider>,
    limit: Duration,
    running: Arc<AtomicUsize>,
}

impl TimeoutSimilarity {
    pub fn new(inner: Arc<dyn SimilarityProvider>, limit: Duration) -> Self {
        Self {
            inner,
            limit,
            running: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Helper threads that have not finished yet, abandoned ones included
    pub fn helpers_running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }
}

/// Decrements the live-helper count when a helper exits, even by panic
struct RunningGuard(Arc<AtomicUsize>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SimilarityProvider for TimeoutSimilarity {
    fn similarity(&self, a: &Path, b: &Path) -> Result<SimilarityScore, SimilarityError> {
        let (sender, receiver) = bounded(1);
        let inner = Arc::clone(&self.inner);
        let (path_a, path_b) = (a.to_path_buf(), b.to_path_buf());

        self.running.fetch_add(1, Ordering::SeqCst);
        let guard = RunningGuard(Arc::clone(&self.running));

        thread::Builder::new()
            .name("similarity".to_string())
            .spawn(move || {
                let _guard = guard;
                let _ = sender.send(inner.similarity(&path_a, &path_b));
            })
            .map_err(|e| SimilarityError::Computation(format!("failed to spawn worker: {}", e)))?;

        match receiver.recv_timeout(self.limit) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    a = %a.display(),
                    b = %b.display(),
                    limit = ?self.limit,
                    helpers_running = self.helpers_running(),
                    "similarity timed out"
                );
                Err(SimilarityError::TimedOut { limit: self.limit })
            }
            Err(RecvTimeoutError::Disconnected) => Err(SimilarityError::Computation(
                "similarity worker exited without a result".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowProvider {
        delay: Duration,
    }

    impl SimilarityProvider for SlowProvider {
        fn similarity(&self, _a: &Path, _b: &Path) -> Result<SimilarityScore, SimilarityError> {
            thread::sleep(self.delay);
            Ok(SimilarityScore::new(0.9))
        }
    }

    #[test]
    fn fast_call_passes_through() {
        let provider = TimeoutSimilarity::new(
            Arc::new(SlowProvider {
                delay: Duration::from_millis(0),
            }),
            Duration::from_secs(5),
        );

        let score = provider.similarity(Path::new("a"), Path::new("b")).unwrap();
        assert_eq!(score.value(), 0.9);
    }

    #[test]
    fn slow_call_times_out() {
        let provider = TimeoutSimilarity::new(
            Arc::new(SlowProvider {
                delay: Duration::from_millis(500),
            }),
            Duration::from_millis(20),
        );

        let result = provider.similarity(Path::new("a"), Path::new("b"));
        assert!(matches!(result, Err(SimilarityError::TimedOut { .. })));
    }

    #[test]
    fn abandoned_helper_is_counted_until_it_finishes() {
        let provider = TimeoutSimilarity::new(
            Arc::new(SlowProvider {
                delay: Duration::from_millis(200),
            }),
            Duration::from_millis(10),
        );

        assert!(provider.similarity(Path::new("a"), Path::new("b")).is_err());
        assert_eq!(provider.helpers_running(), 1);

        let mut waited = Duration::ZERO;
        while provider.helpers_running() > 0 && waited < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(20));
            waited += Duration::from_millis(20);
        }
        assert_eq!(provider.helpers_running(), 0);
    }

    #[test]
    fn finished_calls_leave_no_helpers() {
        let provider = TimeoutSimilarity::new(
            Arc::new(SlowProvider {
                delay: Duration::from_millis(0),
            }),
            Duration::from_secs(5),
        );

        for _ in 0..3 {
            provider.similarity(Path::new("a"), Path::new("b")).unwrap();
        }
        // The helper sends before its guard drops; give it a moment to exit
        let mut waited = Duration::ZERO;
        while provider.helpers_running() > 0 && waited < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(5));
            waited += Duration::from_millis(5);
        }
        assert_eq!(provider.helpers_running(), 0);
    }
}
