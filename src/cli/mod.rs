//! # CLI Module
//!
//! Command-line interface for the cross-collection image matcher.
//!
//! ## Usage
//! ```bash
//! # Compare two folders
//! image-match ~/Photos/old ~/Photos/new
//!
//! # Stricter near-duplicate threshold
//! image-match ~/Photos/old ~/Photos/new --threshold 0.9
//!
//! # Every pair, including unrelated ones, as CSV
//! image-match ~/Photos/old ~/Photos/new --all --output csv
//! ```

use clap::{Parser, ValueEnum};
use console::{style, Term};
use image_crossmatch::core::corpus::LoaderConfig;
use image_crossmatch::core::matcher::{DecodeFailurePolicy, MatchOutcome, Threshold};
use image_crossmatch::core::pipeline::{CancellationToken, Pipeline, PipelineResult};
use image_crossmatch::core::reporter::{export_csv, export_json, render_plain, Summary};
use image_crossmatch::events::{
    CompareEvent, DigestEvent, Event, EventChannel, PipelineEvent, PipelinePhase,
};
use image_crossmatch::signal::{self, EXIT_CODE_INTERRUPTED};
use image_crossmatch::{MatchFinderError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Image Match - find images shared between two folders
#[derive(Parser, Debug)]
#[command(name = "image-match")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// First collection (files directly inside this folder)
    dir_a: PathBuf,

    /// Second collection
    dir_b: PathBuf,

    /// SSIM score a pair must exceed to count as a near-duplicate
    #[arg(short, long, default_value_t = Threshold::DEFAULT, allow_negative_numbers = true)]
    threshold: f64,

    /// Also print unrelated pairs
    #[arg(long)]
    all: bool,

    /// Treat files that cannot be decoded as unrelated instead of failures
    #[arg(long)]
    hide_decode_failures: bool,

    /// Give up on a single comparison after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Downscale images so the longer side is at most this many pixels
    #[arg(long)]
    max_dimension: Option<u32>,

    /// Number of worker threads (default: one per CPU)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Only consider files with a known image extension
    #[arg(long)]
    only_images: bool,

    /// Skip hidden files (starting with .)
    #[arg(long)]
    skip_hidden: bool,

    /// Output format
    #[arg(short, long, default_value = "plain")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One line per finding
    Plain,
    /// Human-readable output with colors and progress
    Pretty,
    /// JSON report for scripting
    Json,
    /// CSV, one row per outcome
    Csv,
}

/// Run the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    image_crossmatch::init_tracing(cli.verbose);

    let token = CancellationToken::new();
    if let Err(e) = signal::install_handler(&token) {
        warn!(error = %e, "Ctrl+C will terminate without a partial report");
    }

    match run_match(&cli, token) {
        Ok(result) if result.cancelled() => ExitCode::from(EXIT_CODE_INTERRUPTED),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            let term = Term::stderr();
            term.write_line(&format!("{} {}", style("error:").red().bold(), e))
                .ok();
            ExitCode::from(e.exit_code())
        }
    }
}

fn run_match(cli: &Cli, token: CancellationToken) -> Result<PipelineResult> {
    let mut loader = LoaderConfig {
        include_hidden: !cli.skip_hidden,
        ..LoaderConfig::default()
    };
    if cli.only_images {
        loader = loader.images_only();
    }

    let decode_failures = if cli.hide_decode_failures {
        DecodeFailurePolicy::Suppress
    } else {
        DecodeFailurePolicy::Report
    };

    let pipeline = Pipeline::builder()
        .collections(&cli.dir_a, &cli.dir_b)
        .threshold(cli.threshold)
        .report_unrelated(cli.all)
        .decode_failures(decode_failures)
        .similarity_timeout(cli.timeout_secs.map(Duration::from_secs))
        .max_dimension(cli.max_dimension)
        .loader_config(loader)
        .jobs(cli.jobs)
        .cancellation(token)
        .build()?;

    let pretty = cli.output == OutputFormat::Pretty;
    let term = Term::stdout();

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Image Match").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    // Set up event handling
    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if pretty {
        let pb = ProgressBar::new(0);
        let template = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";
        if let Ok(bar_style) = ProgressStyle::default_bar().template(template) {
            pb.set_style(bar_style.progress_chars("█▓░"));
        }
        Some(pb)
    } else {
        None
    };

    // Handle events in a separate thread; without a progress bar the
    // receiver is simply dropped and events are discarded
    let event_thread = progress.map(|pb| {
        thread::spawn(move || {
            for event in receiver.iter() {
                match event {
                    Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                        pb.set_message(format!("{}", phase));
                        if phase == PipelinePhase::Comparing {
                            pb.set_position(0);
                        }
                    }
                    Event::Digest(DigestEvent::Started { total_files }) => {
                        pb.set_length(total_files as u64);
                        pb.set_position(0);
                    }
                    Event::Digest(DigestEvent::Progress(p)) => {
                        pb.set_position(p.completed as u64);
                    }
                    Event::Compare(CompareEvent::Started { total_pairs }) => {
                        pb.set_length(total_pairs as u64);
                    }
                    Event::Compare(CompareEvent::Progress(p)) => {
                        pb.set_position(p.pairs_completed as u64);
                        pb.set_message(format!("Comparing ({} matches)", p.matches_found));
                    }
                    Event::Pipeline(PipelineEvent::Completed { .. })
                    | Event::Pipeline(PipelineEvent::Cancelled)
                    | Event::Pipeline(PipelineEvent::Error { .. }) => {
                        pb.finish_and_clear();
                    }
                    _ => {}
                }
            }
        })
    });

    // Run the pipeline
    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    if let Some(handle) = event_thread {
        handle.join().ok();
    }

    let result = result?;

    // Output results
    match cli.output {
        OutputFormat::Plain => print_plain_results(&result),
        OutputFormat::Pretty => print_pretty_results(&term, &result),
        OutputFormat::Json => export_json(&result.report, io::stdout().lock()),
        OutputFormat::Csv => export_csv(&result.report.outcomes, io::stdout().lock()),
    }
    .map_err(MatchFinderError::Report)?;

    Ok(result)
}

fn print_plain_results(result: &PipelineResult) -> io::Result<()> {
    let mut out = io::stdout().lock();
    for outcome in &result.report.outcomes {
        writeln!(out, "{}", render_plain(outcome))?;
    }
    out.flush()
}

fn print_pretty_results(term: &Term, result: &PipelineResult) -> io::Result<()> {
    let summary = Summary::from_report(&result.report);

    term.write_line(&format!(
        "{} Comparison {}",
        style("✓").green().bold(),
        if summary.cancelled {
            "interrupted"
        } else {
            "complete"
        }
    ))?;
    term.write_line("")?;

    term.write_line(&format!(
        "  {} files in A, {} files in B, compared in {:.1}s",
        style(result.files_a).cyan(),
        style(result.files_b).cyan(),
        result.duration_ms as f64 / 1000.0
    ))?;
    term.write_line(&format!("  {}", summary.describe()))?;
    term.write_line("")?;

    if result.report.outcomes.is_empty() {
        term.write_line(&format!("  {}", style("No shared images found.").dim()))?;
        return Ok(());
    }

    for outcome in &result.report.outcomes {
        let marker = match outcome {
            MatchOutcome::ExactDuplicate { .. } => style("=").green().bold(),
            MatchOutcome::NearDuplicate { .. } => style("≈").yellow().bold(),
            MatchOutcome::Unrelated { .. } => style("·").dim(),
            MatchOutcome::ComparisonFailed { .. } => style("!").red().bold(),
        };
        term.write_line(&format!("  {} {}", marker, render_plain(outcome)))?;
    }

    Ok(())
}
