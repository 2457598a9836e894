//! Title resolution against a paper search service.
//!
//! A [`Resolver`] turns one citation title into an explicit
//! [`ResolveOutcome`]: a downloadable [`ArtifactLink`], a clean not-found, or
//! a terminal failure. Resolvers never return `Err` or panic for expected
//! conditions, so the pipeline branches on the outcome instead of catching
//! errors.
//!
//! # Architecture
//!
//! - [`Resolver`] - Async trait that resolvers implement
//! - [`ArxivSearchResolver`] - arXiv search page scraper (first result only)
//! - [`CourtesyPause`] - randomized delay after each search query
//!
//! # Example
//!
//! ```no_run
//! use citefetch_core::download::{HttpClient, ThrottlePolicy};
//! use citefetch_core::resolver::{ArxivSearchResolver, ResolveOutcome, Resolver};
//!
//! # async fn example() {
//! let resolver = ArxivSearchResolver::new(HttpClient::new(ThrottlePolicy::default()));
//! match resolver.resolve("Attention Is All You Need").await {
//!     ResolveOutcome::Found(link) => println!("{} -> {}", link.url, link.name),
//!     ResolveOutcome::NotFound => println!("no match"),
//!     ResolveOutcome::Failed(error) => println!("failed: {error}"),
//! }
//! # }
//! ```

mod arxiv;
mod error;

pub use arxiv::{
    ARXIV_SEARCH_URL, ArxivSearchResolver, CourtesyPause, SEARCH_PAGE_SIZE, parse_first_result,
};
pub use error::ResolveError;

use async_trait::async_trait;

use crate::download::derive_artifact_name;

/// A downloadable PDF and the file name it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLink {
    /// Absolute URL of the PDF.
    pub url: String,
    /// Derived, filesystem-safe file name (see [`derive_artifact_name`]).
    pub name: String,
}

impl ArtifactLink {
    /// Builds a link from an absolute URL, deriving its file name.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::MalformedLink`] if no name can be derived.
    pub fn from_url(url: impl Into<String>) -> Result<Self, ResolveError> {
        let url = url.into();
        match derive_artifact_name(&url) {
            Some(name) => Ok(Self { url, name }),
            None => Err(ResolveError::malformed_link(
                url,
                "no path segment to derive a file name from",
            )),
        }
    }
}

/// Tagged result of resolving one title.
#[derive(Debug)]
pub enum ResolveOutcome {
    /// The first search result carries a PDF link.
    Found(ArtifactLink),
    /// No result entries, or the first entry has no PDF link.
    NotFound,
    /// The query or the result page could not be processed.
    Failed(ResolveError),
}

/// Trait for title resolvers.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// pipeline worker.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Short resolver name for logs.
    fn name(&self) -> &'static str;

    /// Resolves a citation title.
    async fn resolve(&self, title: &str) -> ResolveOutcome;
}
