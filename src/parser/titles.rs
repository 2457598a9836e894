//! Citation title extraction from reference blocks.

use tracing::trace;

/// Closing marker of a citation index such as `[12]`.
const CITATION_MARKER_END: char = ']';

/// Extracts the title from a single reference line.
///
/// Everything up to and including the last `]` is dropped, along with the
/// whitespace that follows it. Lines without a `]` are continuation text and
/// yield `None`.
#[must_use]
pub fn extract_title(line: &str) -> Option<String> {
    let marker = line.rfind(CITATION_MARKER_END)?;
    let rest = &line[marker + CITATION_MARKER_END.len_utf8()..];
    Some(rest.trim_start().trim_end_matches('\r').to_string())
}

/// Splits a reference block into candidate titles in line order.
///
/// Duplicates are kept. Lines lacking a citation marker are skipped.
#[must_use]
#[tracing::instrument(level = "trace", skip(block), fields(block_len = block.len()))]
pub fn extract_titles(block: &str) -> Vec<String> {
    let titles: Vec<String> = block.split('\n').filter_map(extract_title).collect();
    trace!(count = titles.len(), "extracted titles");
    titles
}

/// Normalizes a title into the form used for search keys and failure records.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}
