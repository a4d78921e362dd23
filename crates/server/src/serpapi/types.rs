//! Search request and result types.

use serde::{Deserialize, Serialize};

fn default_engine() -> String {
    "google".to_string()
}

/// Which result sets to fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Organic,
    Autocomplete,
    #[default]
    All,
}

impl SearchKind {
    #[must_use]
    pub const fn wants_organic(self) -> bool {
        matches!(self, Self::Organic | Self::All)
    }

    #[must_use]
    pub const fn wants_autocomplete(self) -> bool {
        matches!(self, Self::Autocomplete | Self::All)
    }
}

/// A keyword search.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub keyword: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default, rename = "type")]
    pub kind: SearchKind,
}

/// One organic result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganicResult {
    #[serde(default)]
    pub position: u32,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: Option<String>,
}

/// A "people also ask" entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedQuestion {
    pub question: String,
    #[serde(default)]
    pub snippet: Option<String>,
}

/// A related search suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedSearch {
    pub query: String,
}

/// Everything returned for one keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub organic: Vec<OrganicResult>,
    pub related_questions: Vec<RelatedQuestion>,
    pub related_searches: Vec<RelatedSearch>,
    pub autocomplete: Vec<String>,
}

// =============================================================================
// Wire envelopes
// =============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct SearchResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub organic_results: Vec<OrganicResult>,
    #[serde(default)]
    pub related_questions: Vec<RelatedQuestion>,
    #[serde(default)]
    pub related_searches: Vec<RelatedSearch>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AutocompleteResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Suggestion {
    pub value: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: SearchRequest =
            serde_json::from_value(serde_json::json!({ "keyword": "linen shirts" })).unwrap();
        assert_eq!(request.engine, "google");
        assert_eq!(request.kind, SearchKind::All);
        assert!(request.kind.wants_organic() && request.kind.wants_autocomplete());

        let request: SearchRequest = serde_json::from_value(
            serde_json::json!({ "keyword": "x", "type": "autocomplete" }),
        )
        .unwrap();
        assert!(!request.kind.wants_organic());
    }
}
