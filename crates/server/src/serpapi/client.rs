//! `SerpApi` HTTP client.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::config::SearchConfig;

use super::SearchError;
use super::types::{AutocompleteResponse, SearchRequest, SearchResponse, SearchResults};

const SERPAPI_BASE_URL: &str = "https://serpapi.com";
const AUTOCOMPLETE_ENGINE: &str = "google_autocomplete";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `SerpApi` client.
#[derive(Clone)]
pub struct SerpApiClient {
    inner: Arc<SerpApiClientInner>,
}

struct SerpApiClientInner {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl SerpApiClient {
    /// Create a client for the public `SerpApi` endpoint.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Http` if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        Self::with_base_url(config, SERPAPI_BASE_URL)
    }

    /// Create a client against another base URL.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Http` if the HTTP client cannot be built.
    pub fn with_base_url(config: &SearchConfig, base_url: &str) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(SerpApiClientInner {
                client,
                api_key: config.api_key.clone(),
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Fetch the result sets `request.kind` asks for.
    ///
    /// # Errors
    ///
    /// Returns an error if any underlying request fails.
    #[instrument(skip(self, request), fields(keyword = %request.keyword, kind = ?request.kind))]
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResults, SearchError> {
        let mut results = SearchResults::default();

        if request.kind.wants_organic() {
            let mut query = vec![
                ("engine", request.engine.as_str()),
                ("q", request.keyword.as_str()),
            ];
            if let Some(location) = request.location.as_deref() {
                query.push(("location", location));
            }

            let response: SearchResponse = self.get(&query).await?;
            if let Some(error) = response.error {
                return Err(SearchError::Api(error));
            }
            results.organic = response.organic_results;
            results.related_questions = response.related_questions;
            results.related_searches = response.related_searches;
        }

        if request.kind.wants_autocomplete() {
            let query = [
                ("engine", AUTOCOMPLETE_ENGINE),
                ("q", request.keyword.as_str()),
            ];
            let response: AutocompleteResponse = self.get(&query).await?;
            if let Some(error) = response.error {
                return Err(SearchError::Api(error));
            }
            results.autocomplete = response.suggestions.into_iter().map(|s| s.value).collect();
        }

        tracing::debug!(
            organic = results.organic.len(),
            autocomplete = results.autocomplete.len(),
            "Search results fetched"
        );
        Ok(results)
    }

    async fn get<T: DeserializeOwned>(&self, query: &[(&str, &str)]) -> Result<T, SearchError> {
        let response = self
            .inner
            .client
            .get(format!("{}/search.json", self.inner.base_url))
            .query(query)
            .query(&[("api_key", self.inner.api_key.expose_secret())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or_else(|| format!("status {status}"));
            return Err(SearchError::Api(message));
        }

        serde_json::from_str(&body).map_err(|e| SearchError::Parse(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::serpapi::SearchKind;

    fn client(server: &MockServer) -> SerpApiClient {
        let config = SearchConfig {
            api_key: SecretString::from("serp_test_key"),
        };
        SerpApiClient::with_base_url(&config, &server.uri()).unwrap()
    }

    fn request(kind: SearchKind) -> SearchRequest {
        SearchRequest {
            keyword: "linen shirts".to_string(),
            location: Some("Austin, Texas".to_string()),
            engine: "google".to_string(),
            kind,
        }
    }

    #[tokio::test]
    async fn test_search_all_merges_engines() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("engine", "google"))
            .and(query_param("q", "linen shirts"))
            .and(query_param("location", "Austin, Texas"))
            .and(query_param("api_key", "serp_test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic_results": [
                    { "position": 1, "title": "Linen Shirts", "link": "https://a.example/linen", "snippet": "Breathable" }
                ],
                "related_questions": [{ "question": "Is linen hot?" }],
                "related_searches": [{ "query": "linen shirts men" }]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("engine", "google_autocomplete"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "suggestions": [{ "value": "linen shirts women" }, { "value": "linen shirts sale" }]
            })))
            .mount(&server)
            .await;

        let results = client(&server).search(&request(SearchKind::All)).await.unwrap();
        assert_eq!(results.organic.len(), 1);
        assert_eq!(results.related_questions[0].question, "Is linen hot?");
        assert_eq!(results.related_searches[0].query, "linen shirts men");
        assert_eq!(results.autocomplete, vec!["linen shirts women", "linen shirts sale"]);
    }

    #[tokio::test]
    async fn test_autocomplete_only_skips_organic() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("engine", "google_autocomplete"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "suggestions": [{ "value": "linen" }] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let results = client(&server)
            .search(&request(SearchKind::Autocomplete))
            .await
            .unwrap();
        assert!(results.organic.is_empty());
        assert_eq!(results.autocomplete, vec!["linen"]);
    }

    #[tokio::test]
    async fn test_error_body_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid API key." })),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .search(&request(SearchKind::Organic))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Api(ref m) if m == "Invalid API key."));
    }
}
