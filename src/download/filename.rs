//! Deterministic artifact naming.
//!
//! An artifact's file name is derived only from its source link: the final
//! path segment with every `.` replaced by `_`, plus a `.pdf` extension.
//! `https://arxiv.org/pdf/1706.03762v7` becomes `1706_03762v7.pdf`. Because
//! the mapping is stable, re-runs find previously downloaded files.

use url::Url;

/// Extension appended to every derived name.
const PDF_EXTENSION: &str = ".pdf";

/// Suffix of the temporary file a download streams into.
pub const PART_SUFFIX: &str = ".part";

/// Derives the file name for the artifact at `link`.
///
/// Query strings and fragments are ignored for URLs. Returns `None` when the
/// link has no usable path segment.
#[must_use]
pub fn derive_artifact_name(link: &str) -> Option<String> {
    let segment = match Url::parse(link) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .map(str::to_string),
        Err(_) => link
            .split(['?', '#'])
            .next()
            .and_then(|path| path.split('/').rfind(|s| !s.is_empty()))
            .map(str::to_string),
    }?;

    let stem = segment.replace('.', "_");
    // Path separators cannot appear in a segment; reject traversal-only names.
    if stem.chars().all(|c| c == '_') {
        return None;
    }
    Some(format!("{stem}{PDF_EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_name_replaces_dots() {
        assert_eq!(
            derive_artifact_name("https://arxiv.org/pdf/1706.03762v7").as_deref(),
            Some("1706_03762v7.pdf")
        );
    }

    #[test]
    fn test_derive_name_existing_pdf_extension_is_flattened() {
        assert_eq!(
            derive_artifact_name("https://arxiv.org/pdf/2301.01234.pdf").as_deref(),
            Some("2301_01234_pdf.pdf")
        );
    }

    #[test]
    fn test_derive_name_old_style_identifier() {
        assert_eq!(
            derive_artifact_name("https://arxiv.org/pdf/hep-th/9901001v1").as_deref(),
            Some("9901001v1.pdf")
        );
    }

    #[test]
    fn test_derive_name_ignores_trailing_slash_and_query() {
        assert_eq!(
            derive_artifact_name("https://arxiv.org/pdf/1512.03385/?download=1").as_deref(),
            Some("1512_03385.pdf")
        );
    }

    #[test]
    fn test_derive_name_relative_link() {
        assert_eq!(
            derive_artifact_name("/pdf/1512.03385v1").as_deref(),
            Some("1512_03385v1.pdf")
        );
    }

    #[test]
    fn test_derive_name_is_stable() {
        let link = "https://arxiv.org/pdf/2005.14165v4";
        assert_eq!(derive_artifact_name(link), derive_artifact_name(link));
    }

    #[test]
    fn test_derive_name_rejects_empty_and_dot_segments() {
        assert_eq!(derive_artifact_name("https://arxiv.org/"), None);
        assert_eq!(derive_artifact_name(""), None);
        assert_eq!(derive_artifact_name("/pdf/.."), None);
    }
}
