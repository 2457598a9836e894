//! Wiring of a full run from a [`PipelineConfig`].
//!
//! [`prepare`] validates the configuration, loads the dataset, opens the
//! failure log and assembles a [`Pipeline`]. Nothing touches the network
//! until [`PreparedRun::execute`] is called.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::config::{ConfigError, PipelineConfig};
use crate::download::{ArtifactStore, FetchError, HttpClient};
use crate::failure::{FailureRecorder, FailureRecorderError};
use crate::parser::{DatasetError, extract_titles, read_reference_blocks};
use crate::pipeline::{Pipeline, PipelineError, PipelineStats, TitleCallback};
use crate::resolver::{ArxivSearchResolver, ResolveError, Resolver};

/// Startup errors. Every other failure is per-title and ends in the log.
#[derive(Debug, Error)]
pub enum RunError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The dataset could not be read.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// The failure log could not be opened or closed.
    #[error(transparent)]
    FailureLog(#[from] FailureRecorderError),

    /// The download directory could not be created.
    #[error("cannot prepare download directory: {0}")]
    DownloadDir(#[from] FetchError),

    /// The search endpoint is unusable.
    #[error(transparent)]
    Resolver(#[from] ResolveError),

    /// The pipeline could not be built or scheduled.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Flattens reference blocks into titles, preserving row then line order.
#[must_use]
pub fn collect_titles(blocks: &[String]) -> Vec<String> {
    blocks.iter().flat_map(|block| extract_titles(block)).collect()
}

/// A run that is ready to execute.
#[derive(Debug)]
pub struct PreparedRun {
    titles: Vec<String>,
    pipeline: Pipeline,
    recorder: Arc<FailureRecorder>,
}

impl PreparedRun {
    /// Titles the run will process.
    #[must_use]
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Shared failure log, for shutdown paths that must close it.
    #[must_use]
    pub fn recorder(&self) -> Arc<FailureRecorder> {
        Arc::clone(&self.recorder)
    }

    /// Registers a per-title completion callback.
    #[must_use]
    pub fn with_title_callback(mut self, callback: TitleCallback) -> Self {
        self.pipeline = self.pipeline.with_title_callback(callback);
        self
    }

    /// Processes every title, then flushes and closes the failure log.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] if scheduling fails or the log cannot be closed.
    pub async fn execute(self) -> Result<PipelineStats, RunError> {
        let outcome = self.pipeline.run(self.titles).await;
        // The log is closed on every path out of the run.
        let closed = self.recorder.close();
        let stats = outcome?;
        closed?;
        Ok(stats)
    }
}

/// Builds a run from `config` using the arXiv search resolver.
///
/// # Errors
///
/// Returns [`RunError`] for invalid configuration, an unreadable dataset, or
/// an unusable failure log, download directory or search URL.
#[instrument(skip(config), fields(dataset = %config.dataset.display()))]
pub fn prepare(config: &PipelineConfig) -> Result<PreparedRun, RunError> {
    config.validate()?;

    let client = HttpClient::new(config.throttle.clone());
    let resolver = ArxivSearchResolver::new(client.clone())
        .with_base_url(&config.search_url)?
        .with_timeout(config.search_timeout)
        .with_pause(config.courtesy_pause());

    prepare_with_resolver(config, client, Arc::new(resolver))
}

/// Builds a run from `config` with a caller-supplied resolver.
///
/// # Errors
///
/// Same as [`prepare`], minus search URL validation.
pub fn prepare_with_resolver(
    config: &PipelineConfig,
    client: HttpClient,
    resolver: Arc<dyn Resolver>,
) -> Result<PreparedRun, RunError> {
    config.validate()?;

    let blocks = read_reference_blocks(&config.dataset, &config.column, config.start)?;
    let titles = collect_titles(&blocks);
    info!(rows = blocks.len(), titles = titles.len(), "titles extracted");

    let store = ArtifactStore::new(client, &config.download_dir)?;
    let recorder = Arc::new(FailureRecorder::open(&config.failed_file)?);
    let pipeline = Pipeline::new(resolver, store, Arc::clone(&recorder), config.concurrency)?;

    Ok(PreparedRun {
        titles,
        pipeline,
        recorder,
    })
}
