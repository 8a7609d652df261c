//! # Reporter Module
//!
//! Turns match outcomes into lines a person (or a script) can read.
//!
//! ## Line Formats
//! | Outcome            | Line                                              |
//! |--------------------|---------------------------------------------------|
//! | `ExactDuplicate`   | `Files A and B have the same hash.`               |
//! | `NearDuplicate`    | `A - B SSIM: 0.8731`                              |
//! | `Unrelated`        | `A - B unrelated SSIM: 0.1200`                    |
//! | `ComparisonFailed` | `A - B comparison failed [decode] A: reason`      |
//!
//! Machine-readable output goes through `export_csv` and `export_json`.

mod export;

pub use export::{export_csv, export_json};

use crate::core::matcher::{MatchOutcome, MatchReport};
use serde::{Deserialize, Serialize};

/// One line describing an outcome
pub fn render_plain(outcome: &MatchOutcome) -> String {
    match outcome {
        MatchOutcome::ExactDuplicate { a, b, .. } => format!(
            "Files {} and {} have the same hash.",
            a.path.display(),
            b.path.display()
        ),
        MatchOutcome::NearDuplicate { a, b, score } => {
            format!("{} - {} SSIM: {}", a.path.display(), b.path.display(), score)
        }
        MatchOutcome::Unrelated { a, b, score } => match score {
            Some(score) => format!(
                "{} - {} unrelated SSIM: {}",
                a.path.display(),
                b.path.display(),
                score
            ),
            None => format!("{} - {} unrelated", a.path.display(), b.path.display()),
        },
        MatchOutcome::ComparisonFailed { a, b, failure } => {
            let culprit = failure
                .path
                .as_ref()
                .map(|p| format!(" {}:", p.display()))
                .unwrap_or_else(|| ":".to_string());
            format!(
                "{} - {} comparison failed [{}]{} {}",
                a.path.display(),
                b.path.display(),
                failure.stage,
                culprit,
                failure.reason
            )
        }
    }
}

/// Order outcomes by `(path in A, path in B)`
pub fn sort_outcomes(outcomes: &mut [MatchOutcome]) {
    outcomes.sort_by(|x, y| {
        let (xa, xb) = x.pair();
        let (ya, yb) = y.pair();
        (&xa.path, &xb.path).cmp(&(&ya.path, &yb.path))
    });
}

/// Counts shown at the end of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub pairs_total: usize,
    pub pairs_evaluated: usize,
    pub exact_duplicates: usize,
    pub near_duplicates: usize,
    pub failed_pairs: usize,
    pub cancelled: bool,
}

impl Summary {
    pub fn from_report(report: &MatchReport) -> Self {
        let stats = &report.stats;
        Self {
            pairs_total: stats.total_pairs,
            pairs_evaluated: stats.pairs_evaluated,
            exact_duplicates: stats.exact,
            near_duplicates: stats.near,
            failed_pairs: stats.failed,
            cancelled: stats.cancelled,
        }
    }

    /// One-line human summary
    pub fn describe(&self) -> String {
        let mut text = format!(
            "{} exact {}, {} near-{} in {} {}",
            self.exact_duplicates,
            plural(self.exact_duplicates, "duplicate", "duplicates"),
            self.near_duplicates,
            plural(self.near_duplicates, "duplicate", "duplicates"),
            self.pairs_evaluated,
            plural(self.pairs_evaluated, "pair", "pairs"),
        );

        if self.failed_pairs > 0 {
            text.push_str(&format!(
                ", {} {} failed to compare",
                self.failed_pairs,
                plural(self.failed_pairs, "pair", "pairs")
            ));
        }

        if self.cancelled {
            text.push_str(&format!(
                " (cancelled after {} of {} pairs)",
                self.pairs_evaluated, self.pairs_total
            ));
        }

        text
    }
}

fn plural<'s>(count: usize, one: &'s str, many: &'s str) -> &'s str {
    if count == 1 {
        one
    } else {
        many
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::corpus::{Collection, FileRef};
    use crate::core::digest::Digest;
    use crate::core::matcher::{FailureStage, MatchStats, PairFailure};
    use crate::core::similarity::SimilarityScore;
    use std::path::PathBuf;

    fn refs(a: &str, b: &str) -> (FileRef, FileRef) {
        (FileRef::new(Collection::A, a), FileRef::new(Collection::B, b))
    }

    #[test]
    fn exact_line_names_both_files() {
        let (a, b) = refs("/a/x.jpg", "/b/z.jpg");
        let outcome = MatchOutcome::ExactDuplicate {
            a,
            b,
            digest: Digest::from_bytes([1; 16]),
        };

        assert_eq!(
            render_plain(&outcome),
            "Files /a/x.jpg and /b/z.jpg have the same hash."
        );
    }

    #[test]
    fn near_line_includes_score() {
        let (a, b) = refs("/a/photo.jpg", "/b/photo.jpg");
        let outcome = MatchOutcome::NearDuplicate {
            a,
            b,
            score: SimilarityScore::new(0.85),
        };

        assert_eq!(
            render_plain(&outcome),
            "/a/photo.jpg - /b/photo.jpg SSIM: 0.8500"
        );
    }

    #[test]
    fn failed_line_names_culprit_and_stage() {
        let (a, b) = refs("/a/notes.txt", "/b/photo.jpg");
        let outcome = MatchOutcome::ComparisonFailed {
            a,
            b,
            failure: PairFailure {
                path: Some(PathBuf::from("/a/notes.txt")),
                stage: FailureStage::Decode,
                reason: "unsupported format".to_string(),
            },
        };

        let line = render_plain(&outcome);
        assert!(line.starts_with("/a/notes.txt - /b/photo.jpg comparison failed [decode]"));
        assert!(line.ends_with("/a/notes.txt: unsupported format"));
    }

    #[test]
    fn sort_orders_by_path_pair() {
        let (a2, b1) = refs("/a/2", "/b/1");
        let (a1, b2) = refs("/a/1", "/b/2");
        let (a1_again, b1_again) = refs("/a/1", "/b/1");
        let mut outcomes = vec![
            MatchOutcome::Unrelated { a: a2, b: b1, score: None },
            MatchOutcome::Unrelated { a: a1, b: b2, score: None },
            MatchOutcome::Unrelated { a: a1_again, b: b1_again, score: None },
        ];

        sort_outcomes(&mut outcomes);

        let order: Vec<_> = outcomes
            .iter()
            .map(|o| (o.pair().0.path.clone(), o.pair().1.path.clone()))
            .collect();
        assert_eq!(
            order,
            vec![
                (PathBuf::from("/a/1"), PathBuf::from("/b/1")),
                (PathBuf::from("/a/1"), PathBuf::from("/b/2")),
                (PathBuf::from("/a/2"), PathBuf::from("/b/1")),
            ]
        );
    }

    #[test]
    fn summary_mentions_failures_and_cancellation() {
        let report = MatchReport {
            outcomes: Vec::new(),
            stats: MatchStats {
                total_pairs: 10,
                pairs_evaluated: 4,
                exact: 1,
                near: 2,
                unrelated: 0,
                failed: 1,
                digests_computed: 7,
                digest_failures: 0,
                cancelled: true,
            },
        };

        let text = Summary::from_report(&report).describe();

        assert!(text.starts_with("1 exact duplicate, 2 near-duplicates in 4 pairs"));
        assert!(text.contains("1 pair failed to compare"));
        assert!(text.contains("cancelled after 4 of 10 pairs"));
    }
}
