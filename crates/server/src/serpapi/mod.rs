//! `SerpApi` search results client.
//!
//! Organic results, "people also ask" questions and related searches come
//! from the regular engine; autocomplete suggestions come from the
//! `google_autocomplete` engine.

mod client;
pub mod types;

use thiserror::Error;

pub use client::SerpApiClient;
pub use types::{
    OrganicResult, RelatedQuestion, RelatedSearch, SearchKind, SearchRequest, SearchResults,
};

/// Errors that can occur when querying `SerpApi`.
#[derive(Debug, Error)]
pub enum SearchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// `SerpApi` returned an error status or an `error` field.
    #[error("SerpApi error: {0}")]
    Api(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(String),
}
