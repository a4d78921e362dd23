//! Stored per-product analyses.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopseo_core::StoreId;
use shopseo_core::seo::SeoAnalysisResult;

/// An analysis as persisted for one (store, product) pair.
#[derive(Debug, Clone, Serialize)]
pub struct StoredAnalysis {
    pub store_id: StoreId,
    #[serde(flatten)]
    pub result: SeoAnalysisResult,
    pub analyzed_at: DateTime<Utc>,
}
