//! Shared User-Agent string for search and download requests.
//!
//! Search and download traffic use one identifying User-Agent so the remote
//! service sees a consistent client.

/// Repository URL from the package manifest (empty when not declared).
const PACKAGE_REPOSITORY: &str = env!("CARGO_PKG_REPOSITORY");

/// Default User-Agent for all requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    user_agent_with(env!("CARGO_PKG_VERSION"), PACKAGE_REPOSITORY)
}

/// A contact URL is only advertised when the manifest declares one.
fn user_agent_with(version: &str, repository: &str) -> String {
    let repository = repository.trim();
    if repository.is_empty() {
        format!("citefetch/{version} (academic-research-tool)")
    } else {
        format!("citefetch/{version} (academic-research-tool; +{repository})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_contains_version() {
        let ua = default_user_agent();
        assert_eq!(
            Some(env!("CARGO_PKG_VERSION")),
            ua.strip_prefix("citefetch/")
                .and_then(|s| s.split(' ').next()),
            "UA must contain crate version"
        );
    }

    #[test]
    fn test_user_agent_identifies_as_research_tool() {
        let ua = default_user_agent();
        assert!(
            ua.contains("academic-research-tool"),
            "UA must identify as academic-research-tool: {ua}"
        );
    }

    #[test]
    fn test_user_agent_omits_contact_without_repository() {
        assert_eq!(
            user_agent_with("0.1.0", ""),
            "citefetch/0.1.0 (academic-research-tool)"
        );
        assert_eq!(default_user_agent().contains('+'), !PACKAGE_REPOSITORY.is_empty());
    }

    #[test]
    fn test_user_agent_advertises_declared_repository() {
        assert_eq!(
            user_agent_with("0.1.0", "https://example.org/citefetch"),
            "citefetch/0.1.0 (academic-research-tool; +https://example.org/citefetch)"
        );
    }
}
