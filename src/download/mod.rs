//! Throttle-aware HTTP fetching and artifact storage.
//!
//! This module provides the fetch layer shared by search and download:
//!
//! # Features
//!
//! - [`HttpClient`] performs GETs and transparently waits out throttling
//!   responses according to a [`ThrottlePolicy`]
//! - Streaming downloads into a per-download `.part` file that is moved
//!   into place on completion, never over an existing artifact
//! - [`ArtifactStore`] skips downloads whose derived file already exists
//! - Structured [`FetchError`] values with full context
//!
//! # Example
//!
//! ```no_run
//! use citefetch_core::download::{ArtifactStore, HttpClient, ThrottlePolicy};
//! use citefetch_core::resolver::ArtifactLink;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(ThrottlePolicy::default());
//! let store = ArtifactStore::new(client, Path::new("./downloads"))?;
//! let link = ArtifactLink::from_url("https://arxiv.org/pdf/1706.03762v7")?;
//! let outcome = store.ensure(&link).await?;
//! println!("{}", outcome.path().display());
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod filename;
mod retry;
mod store;

pub use client::{FileWrite, HttpClient};
pub use constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, SEARCH_TIMEOUT_SECS};
pub use error::FetchError;
pub use filename::{PART_SUFFIX, derive_artifact_name};
pub use retry::{ThrottleDecision, ThrottlePolicy, is_throttle_status};
pub use store::{ArtifactStore, StoreOutcome};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, FetchError>` explicitly in function signatures.
