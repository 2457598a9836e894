//! Validated run configuration.
//!
//! [`PipelineConfig`] replaces interactive startup prompts: every input the
//! run needs is an explicit field, checked once by [`PipelineConfig::validate`]
//! before any file is opened or request sent.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::download::{SEARCH_TIMEOUT_SECS, ThrottlePolicy};
use crate::resolver::{ARXIV_SEARCH_URL, CourtesyPause};

/// Minimum allowed worker pool size.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed worker pool size.
pub const MAX_CONCURRENCY: usize = 100;

/// Default worker pool size.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Dataset column holding the reference blocks.
pub const DEFAULT_REFERENCE_COLUMN: &str = "IntroRefer";

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Concurrency outside the supported range.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The rejected value.
        value: usize,
    },

    /// Courtesy pause bounds are inverted.
    #[error("invalid courtesy pause: minimum {min_ms}ms exceeds maximum {max_ms}ms")]
    InvalidPause {
        /// Minimum in milliseconds.
        min_ms: u128,
        /// Maximum in milliseconds.
        max_ms: u128,
    },

    /// Search timeout of zero.
    #[error("search timeout must be greater than zero")]
    ZeroSearchTimeout,

    /// Empty reference column name.
    #[error("reference column name must not be empty")]
    EmptyColumn,

    /// The search URL is not an absolute http(s) URL.
    #[error("invalid search URL '{url}': expected an absolute http(s) URL")]
    InvalidSearchUrl {
        /// The rejected URL.
        url: String,
    },
}

/// Everything a pipeline run needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// CSV dataset path.
    pub dataset: PathBuf,
    /// Column holding the reference blocks.
    pub column: String,
    /// Data rows to skip before processing.
    pub start: usize,
    /// Directory PDFs are written to (created if absent).
    pub download_dir: PathBuf,
    /// Append-only log of failed titles.
    pub failed_file: PathBuf,
    /// Worker pool size.
    pub concurrency: usize,
    /// Search endpoint base URL.
    pub search_url: String,
    /// Per-query search timeout.
    pub search_timeout: Duration,
    /// Backoff policy for throttling responses.
    pub throttle: ThrottlePolicy,
    /// Lower bound of the post-query courtesy pause.
    pub pause_min: Duration,
    /// Upper bound of the post-query courtesy pause.
    pub pause_max: Duration,
}

impl PipelineConfig {
    /// Creates a configuration with defaults for everything but the paths.
    #[must_use]
    pub fn new(
        dataset: impl Into<PathBuf>,
        download_dir: impl Into<PathBuf>,
        failed_file: impl Into<PathBuf>,
    ) -> Self {
        let pause = CourtesyPause::default();
        Self {
            dataset: dataset.into(),
            column: DEFAULT_REFERENCE_COLUMN.to_string(),
            start: 0,
            download_dir: download_dir.into(),
            failed_file: failed_file.into(),
            concurrency: DEFAULT_CONCURRENCY,
            search_url: ARXIV_SEARCH_URL.to_string(),
            search_timeout: Duration::from_secs(SEARCH_TIMEOUT_SECS),
            throttle: ThrottlePolicy::default(),
            pause_min: pause.min(),
            pause_max: pause.max(),
        }
    }

    /// Checks field ranges and consistency.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ConfigError::InvalidConcurrency {
                value: self.concurrency,
            });
        }
        if self.pause_min > self.pause_max {
            return Err(ConfigError::InvalidPause {
                min_ms: self.pause_min.as_millis(),
                max_ms: self.pause_max.as_millis(),
            });
        }
        if self.search_timeout.is_zero() {
            return Err(ConfigError::ZeroSearchTimeout);
        }
        if self.column.trim().is_empty() {
            return Err(ConfigError::EmptyColumn);
        }
        match url::Url::parse(&self.search_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::InvalidSearchUrl {
                    url: self.search_url.clone(),
                });
            }
        }
        Ok(())
    }

    /// Courtesy pause built from the configured bounds.
    #[must_use]
    pub fn courtesy_pause(&self) -> CourtesyPause {
        CourtesyPause::new(self.pause_min, self.pause_max)
    }
}
