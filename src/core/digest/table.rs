//! Digest table: every file's digest, computed once before matching.

use super::{Digest, DigestProvider};
use crate::core::corpus::{Collection, Corpus};
use crate::core::matcher::CancellationToken;
use crate::error::DigestError;
use crate::events::{DigestEvent, DigestProgress, Event, EventSender};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Digests of both corpora, indexed like the corpora's file lists.
///
/// Populated once, then only read. Workers share it by reference.
#[derive(Debug)]
pub struct DigestTable {
    a: Vec<Result<Digest, DigestError>>,
    b: Vec<Result<Digest, DigestError>>,
}

impl DigestTable {
    /// Digest every file of both corpora in parallel.
    ///
    /// Performs exactly `corpus_a.len() + corpus_b.len()` digest calls unless
    /// `cancel` fires first; files not yet started are then recorded as
    /// `DigestError::Cancelled` without being read.
    pub fn build(
        provider: &dyn DigestProvider,
        corpus_a: &Corpus,
        corpus_b: &Corpus,
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> Self {
        let total = corpus_a.len() + corpus_b.len();
        events.send(Event::Digest(DigestEvent::Started { total_files: total }));

        let completed = AtomicUsize::new(0);
        let digest_side = |corpus: &Corpus| -> Vec<Result<Digest, DigestError>> {
            corpus
                .files()
                .par_iter()
                .map(|file| {
                    if cancel.is_cancelled() {
                        return Err(DigestError::Cancelled {
                            path: file.path.clone(),
                        });
                    }

                    let result = provider.digest(&file.path);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;

                    if let Err(e) = &result {
                        warn!(path = %file.path.display(), error = %e, "digest failed");
                        events.send(Event::Digest(DigestEvent::Error {
                            path: file.path.clone(),
                            message: e.to_string(),
                        }));
                    }

                    events.send(Event::Digest(DigestEvent::Progress(DigestProgress {
                        completed: done,
                        total,
                        current_path: file.path.clone(),
                    })));

                    result
                })
                .collect()
        };

        let table = Self {
            a: digest_side(corpus_a),
            b: digest_side(corpus_b),
        };

        let computed = table.computed();
        let failed = table.failures();
        debug!(total, computed, failed, "digest table built");
        events.send(Event::Digest(DigestEvent::Completed {
            digested: computed - failed,
            failed,
        }));

        table
    }

    /// Digest (or failure) of the `index`-th file on one side.
    ///
    /// # Panics
    /// If `index` is out of range for that side's corpus.
    pub fn get(&self, side: Collection, index: usize) -> &Result<Digest, DigestError> {
        match side {
            Collection::A => &self.a[index],
            Collection::B => &self.b[index],
        }
    }

    /// Number of digest computations performed to build the table
    pub fn computed(&self) -> usize {
        self.entries()
            .filter(|r| !matches!(r, Err(DigestError::Cancelled { .. })))
            .count()
    }

    /// Number of files that could not be read
    pub fn failures(&self) -> usize {
        self.entries()
            .filter(|r| matches!(r, Err(DigestError::FileUnreadable { .. })))
            .count()
    }

    fn entries(&self) -> impl Iterator<Item = &Result<Digest, DigestError>> {
        self.a.iter().chain(self.b.iter())
    }
}
