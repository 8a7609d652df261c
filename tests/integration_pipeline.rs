//! Integration tests for the pipeline module.
//!
//! These tests run real MD5 digests and SSIM scores over generated images:
//! - Byte-identical copies under different names
//! - Re-encoded and lightly altered versions
//! - Non-image files mixed into a collection
//! - Empty and missing collections

use image::{codecs::jpeg::JpegEncoder, GrayImage, Luma, Rgb, RgbImage};
use image_crossmatch::core::matcher::{DecodeFailurePolicy, FailureStage, MatchKind, MatchOutcome};
use image_crossmatch::core::pipeline::{CancellationToken, Pipeline};
use image_crossmatch::error::{CorpusError, MatchFinderError};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const SIZE: u32 = 64;

/// Smooth diagonal gradient, the kind of content SSIM handles well
fn gradient() -> RgbImage {
    RgbImage::from_fn(SIZE, SIZE, |x, y| {
        let v = ((x + y) * 2) as u8;
        Rgb([v, v / 2 + 40, 255 - v])
    })
}

/// The gradient with a faint checker pattern added
fn gradient_with_noise() -> RgbImage {
    let mut image = gradient();
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let delta: i16 = if (x + y) % 2 == 0 { 3 } else { -3 };
        for channel in pixel.0.iter_mut() {
            *channel = (*channel as i16 + delta).clamp(0, 255) as u8;
        }
    }
    image
}

/// Photographic negative of the gradient
fn inverted_gradient() -> GrayImage {
    GrayImage::from_fn(SIZE, SIZE, |x, y| Luma([255 - ((x + y) * 2) as u8]))
}

fn save_jpeg(image: &RgbImage, path: &Path) {
    let file = File::create(path).unwrap();
    JpegEncoder::new_with_quality(file, 92)
        .encode_image(image)
        .unwrap();
}

fn collections() -> (TempDir, TempDir) {
    (TempDir::new().unwrap(), TempDir::new().unwrap())
}

fn paths(outcome: &MatchOutcome) -> (PathBuf, PathBuf) {
    let (a, b) = outcome.pair();
    (a.path.clone(), b.path.clone())
}

#[test]
fn copied_file_is_an_exact_duplicate() {
    let (dir_a, dir_b) = collections();
    gradient().save(dir_a.path().join("x.png")).unwrap();
    fs::copy(dir_a.path().join("x.png"), dir_b.path().join("renamed.png")).unwrap();

    let result = Pipeline::builder()
        .collections(dir_a.path(), dir_b.path())
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.report.outcomes.len(), 1);
    assert_eq!(result.report.outcomes[0].kind(), MatchKind::Exact);
    assert_eq!(
        paths(&result.report.outcomes[0]),
        (dir_a.path().join("x.png"), dir_b.path().join("renamed.png"))
    );
}

#[test]
fn reencoded_image_is_a_near_duplicate() {
    let (dir_a, dir_b) = collections();
    gradient().save(dir_a.path().join("photo.png")).unwrap();
    save_jpeg(&gradient(), &dir_b.path().join("photo.jpg"));

    let result = Pipeline::builder()
        .collections(dir_a.path(), dir_b.path())
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.report.outcomes.len(), 1);
    let outcome = &result.report.outcomes[0];
    assert_eq!(outcome.kind(), MatchKind::Near);
    assert!(outcome.score().unwrap().value() > 0.7);
}

#[test]
fn mixed_collection_reports_each_kind() {
    let (dir_a, dir_b) = collections();
    gradient().save(dir_a.path().join("original.png")).unwrap();
    inverted_gradient().save(dir_a.path().join("negative.png")).unwrap();
    fs::write(dir_a.path().join("notes.txt"), "not an image").unwrap();
    gradient_with_noise().save(dir_b.path().join("edited.png")).unwrap();

    let result = Pipeline::builder()
        .collections(dir_a.path(), dir_b.path())
        .build()
        .unwrap()
        .run()
        .unwrap();
    let report = &result.report;

    assert_eq!(report.stats.total_pairs, 3);
    assert_eq!(report.stats.digests_computed, 4);
    assert_eq!(report.stats.near, 1);
    assert_eq!(report.stats.unrelated, 1);
    assert_eq!(report.stats.failed, 1);

    // Sorted by path: notes.txt < original.png
    assert_eq!(report.outcomes.len(), 2);
    match &report.outcomes[0] {
        MatchOutcome::ComparisonFailed { a, failure, .. } => {
            assert!(a.path.ends_with("notes.txt"));
            assert_eq!(failure.stage, FailureStage::Decode);
            assert_eq!(failure.path.as_deref(), Some(a.path.as_path()));
        }
        other => panic!("expected a failed comparison, got {:?}", other),
    }
    assert_eq!(report.outcomes[1].kind(), MatchKind::Near);
    assert!(report.outcomes[1].pair().0.path.ends_with("original.png"));
}

#[test]
fn decode_failures_can_be_suppressed() {
    let (dir_a, dir_b) = collections();
    fs::write(dir_a.path().join("notes.txt"), "not an image").unwrap();
    gradient().save(dir_b.path().join("photo.png")).unwrap();

    let result = Pipeline::builder()
        .collections(dir_a.path(), dir_b.path())
        .decode_failures(DecodeFailurePolicy::Suppress)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(result.report.outcomes.is_empty());
    assert_eq!(result.report.stats.failed, 0);
    assert_eq!(result.report.stats.unrelated, 1);
}

#[test]
fn unrelated_pairs_are_reported_on_request() {
    let (dir_a, dir_b) = collections();
    gradient().save(dir_a.path().join("day.png")).unwrap();
    inverted_gradient().save(dir_b.path().join("night.png")).unwrap();

    let result = Pipeline::builder()
        .collections(dir_a.path(), dir_b.path())
        .report_unrelated(true)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.report.outcomes.len(), 1);
    let outcome = &result.report.outcomes[0];
    assert_eq!(outcome.kind(), MatchKind::Unrelated);
    assert!(outcome.score().unwrap().value() < 0.7);
}

#[test]
fn threshold_controls_near_duplicates() {
    let (dir_a, dir_b) = collections();
    gradient().save(dir_a.path().join("photo.png")).unwrap();
    gradient_with_noise().save(dir_b.path().join("photo.png")).unwrap();

    // SSIM never exceeds 1.0, so nothing can pass a threshold of 1.0
    let result = Pipeline::builder()
        .collections(dir_a.path(), dir_b.path())
        .threshold(1.0)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(result.report.outcomes.is_empty());
    assert_eq!(result.report.stats.unrelated, 1);
}

#[test]
fn swapping_collections_gives_the_same_findings() {
    let (dir_a, dir_b) = collections();
    gradient().save(dir_a.path().join("one.png")).unwrap();
    inverted_gradient().save(dir_a.path().join("two.png")).unwrap();
    gradient_with_noise().save(dir_b.path().join("three.png")).unwrap();
    fs::copy(dir_a.path().join("two.png"), dir_b.path().join("four.png")).unwrap();

    let run = |first: &Path, second: &Path| {
        Pipeline::builder()
            .collections(first, second)
            .build()
            .unwrap()
            .run()
            .unwrap()
    };
    let forward = run(dir_a.path(), dir_b.path());
    let backward = run(dir_b.path(), dir_a.path());

    let mut forward_pairs: Vec<_> = forward
        .report
        .outcomes
        .iter()
        .map(|o| (paths(o), o.kind()))
        .collect();
    let mut backward_pairs: Vec<_> = backward
        .report
        .outcomes
        .iter()
        .map(|o| {
            let (a, b) = paths(o);
            ((b, a), o.kind())
        })
        .collect();
    forward_pairs.sort();
    backward_pairs.sort();

    assert_eq!(forward_pairs, backward_pairs);
    assert_eq!(forward.report.stats.exact, 1);
    assert_eq!(forward.report.stats.near, 1);

    let forward_score = forward
        .report
        .outcomes
        .iter()
        .find_map(|o| o.score())
        .unwrap();
    let backward_score = backward
        .report
        .outcomes
        .iter()
        .find_map(|o| o.score())
        .unwrap();
    assert!((forward_score.value() - backward_score.value()).abs() < 1e-12);
}

#[test]
fn empty_collection_completes_without_comparisons() {
    let (dir_a, dir_b) = collections();
    gradient().save(dir_b.path().join("photo.png")).unwrap();

    let result = Pipeline::builder()
        .collections(dir_a.path(), dir_b.path())
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.files_a, 0);
    assert_eq!(result.files_b, 1);
    assert_eq!(result.report.stats.total_pairs, 0);
    assert!(result.report.outcomes.is_empty());
}

#[test]
fn missing_collection_is_path_unreadable() {
    let dir_a = TempDir::new().unwrap();

    let error = Pipeline::builder()
        .collections(dir_a.path(), "/nonexistent/path/that/does/not/exist")
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    assert!(matches!(
        error,
        MatchFinderError::Corpus(CorpusError::PathUnreadable { .. })
    ));
}

#[test]
fn generous_timeout_does_not_change_results() {
    let (dir_a, dir_b) = collections();
    gradient().save(dir_a.path().join("photo.png")).unwrap();
    gradient_with_noise().save(dir_b.path().join("photo.png")).unwrap();

    let result = Pipeline::builder()
        .collections(dir_a.path(), dir_b.path())
        .similarity_timeout(Some(Duration::from_secs(60)))
        .jobs(Some(1))
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.report.stats.near, 1);
}

#[test]
fn cancellation_stops_before_any_file_is_read() {
    let (dir_a, dir_b) = collections();
    gradient().save(dir_a.path().join("photo.png")).unwrap();
    gradient().save(dir_b.path().join("photo.png")).unwrap();

    let token = CancellationToken::new();
    let pipeline = Pipeline::builder()
        .collections(dir_a.path(), dir_b.path())
        .cancellation(token.clone())
        .build()
        .unwrap();
    token.cancel();

    let result = pipeline.run().unwrap();

    assert!(result.cancelled());
    assert!(result.report.outcomes.is_empty());
    assert_eq!(result.report.stats.pairs_evaluated, 0);
    assert_eq!(result.report.stats.digests_computed, 0);
}
