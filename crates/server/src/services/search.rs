//! Keyword research through search engine results.

use crate::serpapi::{SearchRequest, SearchResults, SerpApiClient};

use super::ServiceError;

/// Looks up search results for a keyword.
pub struct SearchService<'a> {
    client: Option<&'a SerpApiClient>,
}

impl<'a> SearchService<'a> {
    #[must_use]
    pub const fn new(client: Option<&'a SerpApiClient>) -> Self {
        Self { client }
    }

    /// Run a search.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty keyword and `RemoteApi` when the
    /// provider is not configured or fails.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResults, ServiceError> {
        if request.keyword.trim().is_empty() {
            return Err(ServiceError::Validation("keyword is required".to_string()));
        }
        let client = self
            .client
            .ok_or_else(|| ServiceError::RemoteApi("search is not configured".to_string()))?;

        client
            .search(request)
            .await
            .map_err(|e| ServiceError::RemoteApi(e.to_string()))
    }
}
