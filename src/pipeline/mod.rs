//! Concurrent resolve-and-store orchestration.
//!
//! The [`Pipeline`] runs every title through the same chain:
//!
//! ```text
//! PENDING -> RESOLVING -> { STORED | FAILURE-LOGGED }
//! ```
//!
//! # Concurrency Model
//!
//! - Each title runs in its own Tokio task
//! - A semaphore permit is acquired before spawning, bounding in-flight titles
//! - Permits are released automatically when a task finishes (RAII)
//! - Every task is awaited before [`Pipeline::run`] returns
//!
//! # Failure Isolation
//!
//! A title that is not found, fails to resolve, or fails to download is
//! appended to the [`FailureRecorder`]. A task that panics is caught at its
//! join handle and its title recorded the same way, so every title ends with
//! exactly one outcome and no error escapes the run.

mod stats;

pub use stats::{PipelineStats, RunSummary};

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{MAX_CONCURRENCY, MIN_CONCURRENCY};
use crate::download::{ArtifactStore, StoreOutcome};
use crate::failure::FailureRecorder;
use crate::resolver::{ResolveOutcome, Resolver};

/// Error type for pipeline construction and scheduling.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Why a title ended in the failure log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// No result entry, or no PDF link in the first one.
    NotFound,
    /// The search request or result page failed.
    Resolve(String),
    /// The PDF could not be downloaded or written.
    Store(String),
    /// The task panicked.
    Panicked(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::Resolve(msg) => write!(f, "resolution failed: {msg}"),
            Self::Store(msg) => write!(f, "download failed: {msg}"),
            Self::Panicked(msg) => write!(f, "task panicked: {msg}"),
        }
    }
}

/// Terminal outcome of one title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleOutcome {
    /// The PDF was downloaded to this path.
    Stored(PathBuf),
    /// The PDF already existed at this path.
    AlreadyPresent(PathBuf),
    /// The title was appended to the failure log.
    FailureLogged(FailureReason),
}

/// Callback invoked once per finished title (progress reporting).
pub type TitleCallback = Arc<dyn Fn(&str, &TitleOutcome) + Send + Sync>;

/// Bounded concurrent orchestrator of the resolve-and-store chain.
pub struct Pipeline {
    resolver: Arc<dyn Resolver>,
    store: ArtifactStore,
    recorder: Arc<FailureRecorder>,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    on_title_done: Option<TitleCallback>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("resolver", &self.resolver.name())
            .field("store", &self.store)
            .field("recorder", &self.recorder.path())
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates a pipeline with `concurrency` workers.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConcurrency`] if the value is outside
    /// 1..=100.
    pub fn new(
        resolver: Arc<dyn Resolver>,
        store: ArtifactStore,
        recorder: Arc<FailureRecorder>,
        concurrency: usize,
    ) -> Result<Self, PipelineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(PipelineError::InvalidConcurrency { value: concurrency });
        }
        debug!(
            concurrency,
            resolver = resolver.name(),
            "creating pipeline"
        );
        Ok(Self {
            resolver,
            store,
            recorder,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            on_title_done: None,
        })
    }

    /// Registers a callback run after each title finishes.
    #[must_use]
    pub fn with_title_callback(mut self, callback: TitleCallback) -> Self {
        self.on_title_done = Some(callback);
        self
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Processes every title and waits for all of them to finish.
    ///
    /// Individual title failures never make this method fail; they are
    /// recorded and counted in the returned stats.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::SemaphoreClosed`] if the semaphore is closed.
    #[instrument(skip(self, titles), fields(titles = titles.len()))]
    pub async fn run(&self, titles: Vec<String>) -> Result<PipelineStats, PipelineError> {
        let stats = PipelineStats::new();
        let mut handles: Vec<(String, JoinHandle<TitleOutcome>)> = Vec::with_capacity(titles.len());

        info!("starting title processing");

        for title in titles {
            // Acquire semaphore permit (blocks if at concurrency limit)
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| PipelineError::SemaphoreClosed)?;

            let resolver = Arc::clone(&self.resolver);
            let store = self.store.clone();
            let recorder = Arc::clone(&self.recorder);
            let task_title = title.clone();

            let handle = tokio::spawn(async move {
                // Permit is dropped when this block exits (RAII)
                let _permit = permit;
                process_title(resolver.as_ref(), &store, &recorder, &task_title).await
            });
            handles.push((title, handle));
        }

        debug!(task_count = handles.len(), "waiting for titles to complete");

        // Outcomes are counted here, once per title, after the task is gone.
        for (title, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    warn!(title = %title, error = %join_error, "title task panicked");
                    record_failure(
                        &self.recorder,
                        &title,
                        FailureReason::Panicked(join_error.to_string()),
                    )
                    .await
                }
            };
            stats.observe(&outcome);
            if let Some(callback) = &self.on_title_done {
                callback(&title, &outcome);
            }
        }

        let summary = stats.summary();
        info!(
            stored = summary.stored,
            already_present = summary.already_present,
            failed = summary.failed,
            total = summary.total,
            "title processing complete"
        );

        Ok(stats)
    }
}

/// Runs the resolve-then-store chain for one title.
#[instrument(skip(resolver, store, recorder), fields(resolver = resolver.name()))]
async fn process_title(
    resolver: &dyn Resolver,
    store: &ArtifactStore,
    recorder: &Arc<FailureRecorder>,
    title: &str,
) -> TitleOutcome {
    let link = match resolver.resolve(title).await {
        ResolveOutcome::Found(link) => link,
        ResolveOutcome::NotFound => {
            return record_failure(recorder, title, FailureReason::NotFound).await;
        }
        ResolveOutcome::Failed(error) => {
            return record_failure(recorder, title, FailureReason::Resolve(error.to_string()))
                .await;
        }
    };

    match store.ensure(&link).await {
        Ok(StoreOutcome::Stored(path)) => TitleOutcome::Stored(path),
        Ok(StoreOutcome::AlreadyPresent(path)) => TitleOutcome::AlreadyPresent(path),
        Err(error) => {
            warn!(url = %link.url, error = %error, "download failed");
            record_failure(recorder, title, FailureReason::Store(error.to_string())).await
        }
    }
}

async fn record_failure(
    recorder: &Arc<FailureRecorder>,
    title: &str,
    reason: FailureReason,
) -> TitleOutcome {
    debug!(title, %reason, "recording failure");
    if let Err(error) = recorder.record_async(title).await {
        error!(title, error = %error, "could not append to failure log");
    }
    TitleOutcome::FailureLogged(reason)
}
