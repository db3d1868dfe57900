use serde::{Deserialize, Serialize};

/// Canonical watch URL that legacy video identifiers are rewritten into.
const VIDEO_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Outcome of resolving one lookup key.
///
/// Built once by the strategy that produced it and never mutated afterwards.
/// A result with an empty title is treated as "no result" everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveResult {
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub platform: String,
}

impl ResolveResult {
    pub fn new(title: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            platform: platform.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether this result counts as a hit (non-empty title).
    pub fn is_usable(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

/// Rewrite a legacy video identifier into the URL used as its lookup key.
pub fn canonical_video_url(id: &str) -> String {
    format!("{VIDEO_WATCH_URL}{}", id.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_title_is_not_usable() {
        assert!(!ResolveResult::new("", "generic").is_usable());
        assert!(!ResolveResult::new("   ", "generic").is_usable());
        assert!(ResolveResult::new("Hello", "generic").is_usable());
    }

    #[test]
    fn legacy_ids_map_to_watch_urls() {
        assert_eq!(
            canonical_video_url(" dQw4w9WgXcQ "),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn description_is_omitted_when_empty() {
        let json = serde_json::to_value(ResolveResult::new("T", "github")).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["platform"], "github");
    }
}
