//! citefetch Core Library
//!
//! This library resolves citation titles taken from a dataset of paper
//! introductions against the arXiv search page, and downloads the matching
//! PDFs into a local directory. Titles that cannot be resolved or fetched are
//! appended to a failure log.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Dataset reading and citation title extraction
//! - [`download`] - Throttle-aware HTTP fetching and artifact storage
//! - [`resolver`] - Search-page resolution of titles into PDF links
//! - [`failure`] - Durable append log of unresolved titles
//! - [`pipeline`] - Bounded concurrent resolve-and-store orchestration
//! - [`config`] - Validated run configuration
//! - [`runner`] - Assembly of a full run from a configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod failure;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod runner;
mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, DEFAULT_CONCURRENCY, DEFAULT_REFERENCE_COLUMN, PipelineConfig};
pub use download::{
    ArtifactStore, FetchError, HttpClient, StoreOutcome, ThrottleDecision, ThrottlePolicy,
    derive_artifact_name,
};
pub use failure::{FailureRecorder, FailureRecorderError};
pub use parser::{DatasetError, extract_title, extract_titles, normalize_title, read_reference_blocks};
pub use pipeline::{
    FailureReason, Pipeline, PipelineError, PipelineStats, RunSummary, TitleCallback, TitleOutcome,
};
pub use resolver::{
    ArtifactLink, ArxivSearchResolver, CourtesyPause, ResolveError, ResolveOutcome, Resolver,
};
pub use runner::{PreparedRun, RunError, collect_titles, prepare, prepare_with_resolver};
