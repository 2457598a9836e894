//! arXiv search resolver: turns a citation title into the PDF link of the
//! first search result.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::download::{HttpClient, SEARCH_TIMEOUT_SECS};
use crate::parser::normalize_title;

use super::{ArtifactLink, ResolveError, ResolveOutcome, Resolver};

/// Default arXiv search endpoint.
pub const ARXIV_SEARCH_URL: &str = "https://arxiv.org/search/";

/// Results requested per search page.
pub const SEARCH_PAGE_SIZE: u32 = 25;

#[allow(clippy::expect_used)]
static RESULT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("li.arxiv-result").expect("arxiv result selector is valid")
});

#[allow(clippy::expect_used)]
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

#[allow(clippy::expect_used)]
static PDF_HREF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/pdf").expect("pdf href regex is valid"));

/// Randomized delay taken after every search query.
///
/// Keeps the request rate low enough that the search service rarely starts
/// throttling in the first place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourtesyPause {
    min: Duration,
    max: Duration,
}

impl Default for CourtesyPause {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(2),
            max: Duration::from_secs(5),
        }
    }
}

impl CourtesyPause {
    /// Creates a pause drawn uniformly from `[min, max]`.
    ///
    /// The bounds are swapped if given in the wrong order.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// No pause at all.
    #[must_use]
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Lower bound.
    #[must_use]
    pub fn min(&self) -> Duration {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draws one pause duration.
    #[must_use]
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let min_ms = u64::try_from(self.min.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
    }
}

/// Resolver that scrapes the arXiv search results page.
///
/// Only the first result entry is consulted; there is no ranking or
/// disambiguation among candidates.
#[derive(Debug, Clone)]
pub struct ArxivSearchResolver {
    client: HttpClient,
    base_url: Url,
    timeout: Duration,
    pause: CourtesyPause,
}

impl ArxivSearchResolver {
    /// Creates a resolver against the public arXiv search endpoint.
    ///
    /// # Panics
    ///
    /// Never: [`ARXIV_SEARCH_URL`] is a valid URL.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: Url::parse(ARXIV_SEARCH_URL).expect("default search URL is valid"),
            timeout: Duration::from_secs(SEARCH_TIMEOUT_SECS),
            pause: CourtesyPause::default(),
        }
    }

    /// Points the resolver at another search endpoint (mirror or test server).
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidSearchUrl`] if `base_url` does not parse.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ResolveError> {
        self.base_url = Url::parse(base_url).map_err(|_| ResolveError::InvalidSearchUrl {
            url: base_url.to_string(),
        })?;
        Ok(self)
    }

    /// Sets the per-query timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the courtesy pause taken after each query.
    #[must_use]
    pub fn with_pause(mut self, pause: CourtesyPause) -> Self {
        self.pause = pause;
        self
    }

    /// Builds the search URL for a title.
    ///
    /// Search parameters are appended after any query the base URL carries.
    #[must_use]
    pub fn search_url(&self, title: &str) -> String {
        let normalized = normalize_title(title);
        let query = urlencoding::encode(&normalized);
        let params = format!(
            "query={query}&searchtype=all&abstracts=show&order=-announced_date_first&size={SEARCH_PAGE_SIZE}"
        );

        let mut url = self.base_url.clone();
        let combined = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{params}"),
            _ => params,
        };
        url.set_query(Some(&combined));
        url.into()
    }
}

#[async_trait]
impl Resolver for ArxivSearchResolver {
    fn name(&self) -> &'static str {
        "arxiv-search"
    }

    #[tracing::instrument(skip(self), fields(resolver = "arxiv-search"))]
    async fn resolve(&self, title: &str) -> ResolveOutcome {
        let search_url = self.search_url(title);
        let page = self.client.fetch_text(&search_url, Some(self.timeout)).await;

        let pause = self.pause.sample();
        debug!(pause_ms = pause.as_millis(), "courtesy pause");
        tokio::time::sleep(pause).await;

        let html = match page {
            Ok(html) => html,
            Err(error) => {
                warn!(error = %error, "search request failed");
                return ResolveOutcome::Failed(error.into());
            }
        };

        let outcome = parse_first_result(&html, &self.base_url);
        if let ResolveOutcome::Found(link) = &outcome {
            info!(url = %link.url, name = %link.name, "resolved");
        }
        outcome
    }
}

/// Extracts the PDF link of the first result entry in a search page.
///
/// Entries after the first are never inspected. Relative links are resolved
/// against `base`.
#[must_use]
pub fn parse_first_result(html: &str, base: &Url) -> ResolveOutcome {
    let document = Html::parse_document(html);

    let Some(first) = document.select(&RESULT_SELECTOR).next() else {
        debug!("search returned no results");
        return ResolveOutcome::NotFound;
    };

    let Some(href) = first
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .find(|href| PDF_HREF_PATTERN.is_match(href))
    else {
        debug!("first result has no PDF link");
        return ResolveOutcome::NotFound;
    };

    let absolute = match base.join(href.trim()) {
        Ok(url) => url,
        Err(e) => {
            return ResolveOutcome::Failed(ResolveError::malformed_link(href, e.to_string()));
        }
    };

    match ArtifactLink::from_url(absolute.as_str()) {
        Ok(link) => ResolveOutcome::Found(link),
        Err(error) => ResolveOutcome::Failed(error),
    }
}
