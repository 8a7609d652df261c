//! Pipeline execution implementation.

use crate::core::corpus::{Collection, CorpusLoader, DirCorpusLoader, LoaderConfig};
use crate::core::digest::{DigestProvider, Md5Digester};
use crate::core::matcher::{
    CancellationToken, DecodeFailurePolicy, MatchConfig, MatchEngine, MatchReport, Threshold,
};
use crate::core::reporter::sort_outcomes;
use crate::core::similarity::{SimilarityProvider, SsimComparator, SsimConfig, TimeoutSimilarity};
use crate::error::{ConfigError, MatchFinderError};
use crate::events::{null_sender, Event, EventSender, PipelineEvent, PipelinePhase, PipelineSummary};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// Emitted outcomes (sorted by path pair) and counters
    pub report: MatchReport,
    /// Files listed in collection A
    pub files_a: usize,
    /// Files listed in collection B
    pub files_b: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineResult {
    /// Whether the pass stopped early because of cancellation
    pub fn cancelled(&self) -> bool {
        self.report.stats.cancelled
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root of collection A
    pub collection_a: PathBuf,
    /// Root of collection B
    pub collection_b: PathBuf,
    /// Near-duplicate cut-off, validated at build time
    pub threshold: f64,
    pub report_unrelated: bool,
    pub decode_failures: DecodeFailurePolicy,
    /// Per-pair limit on similarity scoring
    pub similarity_timeout: Option<Duration>,
    /// Downscale images before scoring
    pub max_dimension: Option<u32>,
    pub loader: LoaderConfig,
    /// Worker threads (None = rayon's global pool)
    pub jobs: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            collection_a: PathBuf::new(),
            collection_b: PathBuf::new(),
            threshold: Threshold::DEFAULT,
            report_unrelated: false,
            decode_failures: DecodeFailurePolicy::Report,
            similarity_timeout: None,
            max_dimension: None,
            loader: LoaderConfig::default(),
            jobs: None,
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    cancel: CancellationToken,
    loader: Option<Arc<dyn CorpusLoader>>,
    digester: Option<Arc<dyn DigestProvider>>,
    similarity: Option<Arc<dyn SimilarityProvider>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            cancel: CancellationToken::new(),
            loader: None,
            digester: None,
            similarity: None,
        }
    }

    /// Set the two collection roots
    pub fn collections(mut self, a: impl Into<PathBuf>, b: impl Into<PathBuf>) -> Self {
        self.config.collection_a = a.into();
        self.config.collection_b = b.into();
        self
    }

    /// Set the near-duplicate threshold
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Emit unrelated pairs too
    pub fn report_unrelated(mut self, report: bool) -> Self {
        self.config.report_unrelated = report;
        self
    }

    pub fn decode_failures(mut self, policy: DecodeFailurePolicy) -> Self {
        self.config.decode_failures = policy;
        self
    }

    /// Limit the time spent scoring a single pair
    pub fn similarity_timeout(mut self, limit: Option<Duration>) -> Self {
        self.config.similarity_timeout = limit;
        self
    }

    /// Downscale images so the longer side is at most `max` pixels
    pub fn max_dimension(mut self, max: Option<u32>) -> Self {
        self.config.max_dimension = max;
        self
    }

    /// Set loader configuration
    pub fn loader_config(mut self, config: LoaderConfig) -> Self {
        self.config.loader = config;
        self
    }

    /// Size of the worker pool
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.config.jobs = jobs;
        self
    }

    /// Share a cancellation token with the caller
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Replace the directory loader.
    ///
    /// When set, `loader_config` is ignored and the collection roots are
    /// passed to this loader as given.
    pub fn corpus_loader(mut self, loader: Arc<dyn CorpusLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Replace the MD5 digester
    pub fn digest_provider(mut self, provider: Arc<dyn DigestProvider>) -> Self {
        self.digester = Some(provider);
        self
    }

    /// Replace the SSIM comparator
    pub fn similarity_provider(mut self, provider: Arc<dyn SimilarityProvider>) -> Self {
        self.similarity = Some(provider);
        self
    }

    /// Validate the configuration and build the pipeline
    pub fn build(self) -> Result<Pipeline, MatchFinderError> {
        let threshold = Threshold::new(self.config.threshold)?;

        let pool = match self.config.jobs {
            Some(0) => return Err(ConfigError::InvalidJobs { value: 0 }.into()),
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ConfigError::ThreadPool(e.to_string()))?,
            ),
            None => None,
        };

        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(DirCorpusLoader::new(self.config.loader.clone())));

        let digester = self
            .digester
            .unwrap_or_else(|| Arc::new(Md5Digester::new()));

        let mut similarity = self.similarity.unwrap_or_else(|| {
            Arc::new(SsimComparator::new(SsimConfig {
                max_dimension: self.config.max_dimension,
                ..SsimConfig::default()
            }))
        });
        if let Some(limit) = self.config.similarity_timeout {
            similarity = Arc::new(TimeoutSimilarity::new(similarity, limit));
        }

        let match_config = MatchConfig::default()
            .with_threshold(threshold)
            .with_unrelated(self.config.report_unrelated)
            .with_decode_failures(self.config.decode_failures);

        Ok(Pipeline {
            config: self.config,
            match_config,
            cancel: self.cancel,
            loader,
            digester,
            similarity,
            pool,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The cross-collection matching pipeline
pub struct Pipeline {
    config: PipelineConfig,
    match_config: MatchConfig,
    cancel: CancellationToken,
    loader: Arc<dyn CorpusLoader>,
    digester: Arc<dyn DigestProvider>,
    similarity: Arc<dyn SimilarityProvider>,
    pool: Option<rayon::ThreadPool>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Token that stops the pass between pairs
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<PipelineResult, MatchFinderError> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(
        &self,
        events: &EventSender,
    ) -> Result<PipelineResult, MatchFinderError> {
        let result = match &self.pool {
            Some(pool) => pool.install(|| self.execute(events)),
            None => self.execute(events),
        };

        if let Err(e) = &result {
            events.send(Event::Pipeline(PipelineEvent::Error {
                message: e.to_string(),
            }));
        }

        result
    }

    fn execute(&self, events: &EventSender) -> Result<PipelineResult, MatchFinderError> {
        let start_time = Instant::now();

        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Loading
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Loading,
        }));

        let corpus_a = self
            .loader
            .load_with_events(&self.config.collection_a, Collection::A, events)?;
        let corpus_b = self
            .loader
            .load_with_events(&self.config.collection_b, Collection::B, events)?;

        info!(
            files_a = corpus_a.len(),
            files_b = corpus_b.len(),
            "collections loaded"
        );

        // Phase 2: Digesting
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Digesting,
        }));

        let engine = MatchEngine::new(
            self.digester.as_ref(),
            self.similarity.as_ref(),
            self.match_config.clone(),
        );
        let prepared = engine.prepare_with_events(&corpus_a, &corpus_b, &self.cancel, events);

        // Phase 3: Comparing
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Comparing,
        }));

        let mut report = prepared.run(&self.cancel, events);
        sort_outcomes(&mut report.outcomes);

        let duration_ms = start_time.elapsed().as_millis() as u64;

        if report.stats.cancelled {
            warn!(
                evaluated = report.stats.pairs_evaluated,
                total = report.stats.total_pairs,
                "match pass cancelled"
            );
            events.send(Event::Pipeline(PipelineEvent::Cancelled));
        } else {
            events.send(Event::Pipeline(PipelineEvent::Completed {
                summary: PipelineSummary {
                    files_a: corpus_a.len(),
                    files_b: corpus_b.len(),
                    exact_duplicates: report.stats.exact,
                    near_duplicates: report.stats.near,
                    failed_pairs: report.stats.failed,
                    duration_ms,
                },
            }));
        }

        Ok(PipelineResult {
            report,
            files_a: corpus_a.len(),
            files_b: corpus_b.len(),
            duration_ms,
        })
    }
}
