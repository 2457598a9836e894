//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use citefetch_core::{
    DEFAULT_CONCURRENCY, DEFAULT_REFERENCE_COLUMN, PipelineConfig, ThrottlePolicy,
    resolver::ARXIV_SEARCH_URL,
};

/// Resolve citation titles against arXiv search and download their PDFs.
///
/// Reads reference blocks from a CSV dataset, extracts every bracketed
/// citation title, looks each one up on arXiv and stores the first result's
/// PDF. Titles that cannot be resolved or downloaded are appended to the
/// failure log.
#[derive(Parser, Debug)]
#[command(name = "citefetch")]
#[command(author, version, about)]
pub struct Args {
    /// CSV dataset with a header row
    pub dataset: PathBuf,

    /// Directory PDFs are written to (created if absent)
    #[arg(short = 'o', long, default_value = "./downloads")]
    pub download_dir: PathBuf,

    /// Append-only log of titles that could not be fetched
    #[arg(short = 'f', long, default_value = "./failed.log")]
    pub failed_file: PathBuf,

    /// Maximum titles processed concurrently (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Number of data rows to skip before processing
    #[arg(short = 's', long, default_value_t = 0)]
    pub start: usize,

    /// Dataset column holding the reference blocks
    #[arg(long, default_value = DEFAULT_REFERENCE_COLUMN)]
    pub column: String,

    /// Search endpoint base URL
    #[arg(long, default_value = ARXIV_SEARCH_URL)]
    pub search_url: String,

    /// Per-query search timeout in seconds
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
    pub search_timeout: u64,

    /// Base wait in seconds after a throttling response (403/429)
    #[arg(long, default_value_t = 500)]
    pub throttle_base: u64,

    /// Maximum random extra wait in seconds added to the throttle base
    #[arg(long, default_value_t = 500)]
    pub throttle_jitter: u64,

    /// Give up on a request after this many throttled retries (default: never)
    #[arg(long)]
    pub max_throttle_retries: Option<u32>,

    /// Lower bound of the pause after each search query, in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub pause_min_ms: u64,

    /// Upper bound of the pause after each search query, in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub pause_max_ms: u64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Log level used when `RUST_LOG` is not set.
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Converts the parsed flags into a pipeline configuration.
    pub fn to_config(&self) -> PipelineConfig {
        let throttle = ThrottlePolicy::new(
            Duration::from_secs(self.throttle_base),
            Duration::from_secs(self.throttle_jitter),
        )
        .with_max_attempts(self.max_throttle_retries.map(|n| n.saturating_add(1)));

        let mut config = PipelineConfig::new(&self.dataset, &self.download_dir, &self.failed_file);
        config.column.clone_from(&self.column);
        config.start = self.start;
        config.concurrency = usize::from(self.concurrency);
        config.search_url.clone_from(&self.search_url);
        config.search_timeout = Duration::from_secs(self.search_timeout);
        config.throttle = throttle;
        config.pause_min = Duration::from_millis(self.pause_min_ms);
        config.pause_max = Duration::from_millis(self.pause_max_ms);
        config
    }
}
