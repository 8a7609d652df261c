//! Pairwise match engine.

use super::{
    CancellationToken, DecodeFailurePolicy, FailureStage, MatchConfig, MatchKind, MatchOutcome,
    PairFailure,
};
use crate::core::corpus::{Collection, Corpus, FileRef};
use crate::core::digest::{DigestProvider, DigestTable};
use crate::core::similarity::SimilarityProvider;
use crate::error::SimilarityError;
use crate::events::{null_sender, CompareEvent, CompareProgress, Event, EventSender};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, trace};

/// Counters for one match pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    /// Size of the cross product
    pub total_pairs: usize,
    /// Pairs actually evaluated (less than total when cancelled)
    pub pairs_evaluated: usize,
    pub exact: usize,
    pub near: usize,
    pub unrelated: usize,
    pub failed: usize,
    /// Digest computations performed (all n + m unless cancelled early)
    pub digests_computed: usize,
    /// Files whose digest could not be computed
    pub digest_failures: usize,
    pub cancelled: bool,
}

/// Outcome of a full match pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    /// Emitted outcomes, in no particular order
    pub outcomes: Vec<MatchOutcome>,
    pub stats: MatchStats,
}

impl MatchReport {
    /// Exact and near duplicates
    pub fn matches(&self) -> impl Iterator<Item = &MatchOutcome> {
        self.outcomes.iter().filter(|o| o.is_match())
    }

    /// Pairs that could not be compared
    pub fn failures(&self) -> impl Iterator<Item = &MatchOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.kind() == MatchKind::Failed)
    }
}

/// Classifies cross-collection pairs using a digest provider and a
/// similarity provider
pub struct MatchEngine<'p> {
    digester: &'p dyn DigestProvider,
    similarity: &'p dyn SimilarityProvider,
    config: MatchConfig,
}

impl<'p> MatchEngine<'p> {
    pub fn new(
        digester: &'p dyn DigestProvider,
        similarity: &'p dyn SimilarityProvider,
        config: MatchConfig,
    ) -> Self {
        Self {
            digester,
            similarity,
            config,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Digest both corpora and get ready to evaluate pairs
    pub fn prepare<'a>(&self, corpus_a: &'a Corpus, corpus_b: &'a Corpus) -> PreparedMatch<'a>
    where
        'p: 'a,
    {
        self.prepare_with_events(corpus_a, corpus_b, &CancellationToken::new(), &null_sender())
    }

    /// Like `prepare`, reporting digest progress.
    ///
    /// Once `cancel` fires no further files are read; `run` with the same
    /// token then evaluates no pairs.
    pub fn prepare_with_events<'a>(
        &self,
        corpus_a: &'a Corpus,
        corpus_b: &'a Corpus,
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> PreparedMatch<'a>
    where
        'p: 'a,
    {
        let digests = DigestTable::build(self.digester, corpus_a, corpus_b, cancel, events);

        PreparedMatch {
            similarity: self.similarity,
            config: self.config.clone(),
            corpus_a,
            corpus_b,
            digests,
        }
    }
}

/// Two corpora with their digests computed, ready for pair evaluation.
///
/// Holds no mutable state, so pairs can be evaluated in any order and from
/// any number of threads.
pub struct PreparedMatch<'a> {
    similarity: &'a dyn SimilarityProvider,
    config: MatchConfig,
    corpus_a: &'a Corpus,
    corpus_b: &'a Corpus,
    digests: DigestTable,
}

impl<'a> PreparedMatch<'a> {
    /// Number of pairs in the cross product
    pub fn total_pairs(&self) -> usize {
        self.corpus_a.len() * self.corpus_b.len()
    }

    pub fn digests(&self) -> &DigestTable {
        &self.digests
    }

    /// Classify the pair `(corpus_a[i], corpus_b[j])`.
    ///
    /// # Panics
    /// If either index is out of range.
    pub fn evaluate(&self, i: usize, j: usize) -> MatchOutcome {
        let a = &self.corpus_a.files()[i];
        let b = &self.corpus_b.files()[j];

        let (digest_a, digest_b) = match (
            self.digests.get(Collection::A, i),
            self.digests.get(Collection::B, j),
        ) {
            (Err(e), _) | (_, Err(e)) => {
                return failed(
                    a,
                    b,
                    PairFailure {
                        path: Some(e.path().clone()),
                        stage: FailureStage::Digest,
                        reason: e.to_string(),
                    },
                );
            }
            (Ok(x), Ok(y)) => (x, y),
        };

        if digest_a == digest_b {
            trace!(a = %a.path.display(), b = %b.path.display(), "exact duplicate");
            return MatchOutcome::ExactDuplicate {
                a: a.clone(),
                b: b.clone(),
                digest: *digest_a,
            };
        }

        match self.similarity.similarity(&a.path, &b.path) {
            Ok(score) if self.config.threshold.is_exceeded_by(score) => {
                trace!(a = %a.path.display(), b = %b.path.display(), %score, "near duplicate");
                MatchOutcome::NearDuplicate {
                    a: a.clone(),
                    b: b.clone(),
                    score,
                }
            }
            Ok(score) => MatchOutcome::Unrelated {
                a: a.clone(),
                b: b.clone(),
                score: Some(score),
            },
            Err(SimilarityError::Decode { .. })
                if self.config.decode_failures == DecodeFailurePolicy::Suppress =>
            {
                MatchOutcome::Unrelated {
                    a: a.clone(),
                    b: b.clone(),
                    score: None,
                }
            }
            Err(e) => failed(a, b, similarity_failure(e)),
        }
    }

    /// Whether an outcome is surfaced under the current configuration
    pub fn should_emit(&self, outcome: &MatchOutcome) -> bool {
        outcome.kind() != MatchKind::Unrelated || self.config.report_unrelated
    }

    /// Lazily evaluate every pair in row-major order.
    ///
    /// Each call starts a fresh pass; nothing is cached between passes
    /// except the digests.
    pub fn outcomes(&self) -> impl Iterator<Item = MatchOutcome> + '_ {
        let m = self.corpus_b.len();
        (0..self.corpus_a.len())
            .flat_map(move |i| (0..m).map(move |j| (i, j)))
            .map(move |(i, j)| self.evaluate(i, j))
            .filter(move |outcome| self.should_emit(outcome))
    }

    /// Evaluate every pair in parallel and collect the emitted outcomes.
    ///
    /// The token is checked before each pair; pairs already started run to
    /// completion, so every recorded outcome is whole.
    pub fn run(&self, cancel: &CancellationToken, events: &EventSender) -> MatchReport {
        let total = self.total_pairs();
        let m = self.corpus_b.len();

        events.send(Event::Compare(CompareEvent::Started { total_pairs: total }));
        debug!(total_pairs = total, "match pass started");

        let counters = KindCounters::default();
        let completed = AtomicUsize::new(0);
        let update_interval = std::cmp::min(1000, std::cmp::max(1, total / 50));

        let outcomes: Vec<MatchOutcome> = (0..total)
            .into_par_iter()
            .filter_map(|k| {
                if cancel.is_cancelled() {
                    return None;
                }

                let outcome = self.evaluate(k / m, k % m);
                counters.record(outcome.kind());

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if done % update_interval == 0 || done == total {
                    events.send(Event::Compare(CompareEvent::Progress(CompareProgress {
                        pairs_completed: done,
                        total_pairs: total,
                        matches_found: counters.matches(),
                    })));
                }

                self.should_emit(&outcome).then_some(outcome)
            })
            .collect();

        let pairs_evaluated = completed.load(Ordering::SeqCst);
        let stats = MatchStats {
            total_pairs: total,
            pairs_evaluated,
            exact: counters.exact.load(Ordering::SeqCst),
            near: counters.near.load(Ordering::SeqCst),
            unrelated: counters.unrelated.load(Ordering::SeqCst),
            failed: counters.failed.load(Ordering::SeqCst),
            digests_computed: self.digests.computed(),
            digest_failures: self.digests.failures(),
            cancelled: pairs_evaluated < total,
        };

        events.send(Event::Compare(CompareEvent::Completed {
            pairs_evaluated,
            matches_found: stats.exact + stats.near,
            failures: stats.failed,
        }));
        info!(
            pairs = pairs_evaluated,
            exact = stats.exact,
            near = stats.near,
            failed = stats.failed,
            cancelled = stats.cancelled,
            "match pass finished"
        );

        MatchReport { outcomes, stats }
    }
}

#[derive(Default)]
struct KindCounters {
    exact: AtomicUsize,
    near: AtomicUsize,
    unrelated: AtomicUsize,
    failed: AtomicUsize,
}

impl KindCounters {
    fn record(&self, kind: MatchKind) {
        let counter = match kind {
            MatchKind::Exact => &self.exact,
            MatchKind::Near => &self.near,
            MatchKind::Unrelated => &self.unrelated,
            MatchKind::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn matches(&self) -> usize {
        self.exact.load(Ordering::SeqCst) + self.near.load(Ordering::SeqCst)
    }
}

fn failed(a: &FileRef, b: &FileRef, failure: PairFailure) -> MatchOutcome {
    debug!(
        a = %a.path.display(),
        b = %b.path.display(),
        stage = %failure.stage,
        reason = %failure.reason,
        "comparison failed"
    );
    MatchOutcome::ComparisonFailed {
        a: a.clone(),
        b: b.clone(),
        failure,
    }
}

fn similarity_failure(error: SimilarityError) -> PairFailure {
    let reason = error.to_string();
    let (path, stage) = match error {
        SimilarityError::Decode { path, .. } => (Some(path), FailureStage::Decode),
        SimilarityError::Unreadable { path, .. } => (Some(path), FailureStage::Similarity),
        SimilarityError::TimedOut { .. } => (None, FailureStage::Timeout),
        SimilarityError::Computation(_) => (None, FailureStage::Similarity),
    };
    PairFailure {
        path,
        stage,
        reason,
    }
}
