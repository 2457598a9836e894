//! Error types for title resolution.

use thiserror::Error;

use crate::download::FetchError;

/// Errors that end a resolution attempt as a terminal failure.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The search request failed (status, timeout, network, throttle bound).
    #[error("search request failed: {0}")]
    Fetch(#[from] FetchError),

    /// The result entry carried a link that cannot be turned into an artifact.
    #[error("unusable PDF link '{link}': {reason}")]
    MalformedLink {
        /// The offending href.
        link: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The configured search endpoint is not a valid base URL.
    #[error("invalid search URL '{url}'")]
    InvalidSearchUrl {
        /// The rejected URL.
        url: String,
    },
}

impl ResolveError {
    /// Creates a malformed link error.
    pub fn malformed_link(link: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedLink {
            link: link.into(),
            reason: reason.into(),
        }
    }
}
