//! Per-product SEO analysis.
//!
//! [`analyze_product`] evaluates a fixed rule table over a
//! [`ProductSnapshot`] and returns an [`SeoAnalysisResult`] holding the issues
//! it found and, where a fix is mechanical, a paired [`SeoOptimization`].

mod analyzer;
pub mod text;

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::UnknownVariant;

pub use analyzer::{
    BODY_MIN_WORDS, HANDLE_MAX, META_DESCRIPTION_MAX, META_DESCRIPTION_MIN,
    META_DESCRIPTION_TARGET, META_TITLE_MAX, TITLE_MAX, TITLE_MIN, analyze_product,
};

// =============================================================================
// Issues
// =============================================================================

/// Area of the product an issue concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Title,
    Description,
    Image,
    Content,
    Url,
}

impl IssueType {
    /// Text form used in JSON and the history ledger.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Image => "image",
            Self::Content => "content",
            Self::Url => "url",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IssueType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "description" => Ok(Self::Description),
            "image" => Ok(Self::Image),
            "content" => Ok(Self::Content),
            "url" => Ok(Self::Url),
            _ => Err(UnknownVariant {
                kind: "issue type",
                value: s.to_string(),
            }),
        }
    }
}

/// How much an issue hurts search visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Points deducted from the 100-point score for one issue of this severity.
    #[must_use]
    pub const fn weight(&self) -> u8 {
        match self {
            Self::High => 20,
            Self::Medium => 10,
            Self::Low => 5,
        }
    }
}

/// A single rule violation found on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// =============================================================================
// Optimizations
// =============================================================================

/// Error returned when an optimization field string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown optimization field: {0}")]
pub struct UnknownField(pub String);

/// The remote field an optimization writes.
///
/// Serialized as a flat string (`"meta_description"`, `"image_alt:123"`) so it
/// can be stored in the history ledger and round-trip through JSON unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OptimizationField {
    Title,
    MetaTitle,
    MetaDescription,
    Handle,
    BodyHtml,
    ImageAlt { image_id: i64 },
}

impl OptimizationField {
    const IMAGE_ALT_PREFIX: &'static str = "image_alt:";
}

impl fmt::Display for OptimizationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => f.write_str("title"),
            Self::MetaTitle => f.write_str("meta_title"),
            Self::MetaDescription => f.write_str("meta_description"),
            Self::Handle => f.write_str("handle"),
            Self::BodyHtml => f.write_str("body_html"),
            Self::ImageAlt { image_id } => write!(f, "{}{image_id}", Self::IMAGE_ALT_PREFIX),
        }
    }
}

impl std::str::FromStr for OptimizationField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "meta_title" => Ok(Self::MetaTitle),
            "meta_description" => Ok(Self::MetaDescription),
            "handle" => Ok(Self::Handle),
            "body_html" => Ok(Self::BodyHtml),
            other => other
                .strip_prefix(Self::IMAGE_ALT_PREFIX)
                .and_then(|id| id.parse().ok())
                .map(|image_id| Self::ImageAlt { image_id })
                .ok_or_else(|| UnknownField(other.to_string())),
        }
    }
}

impl TryFrom<String> for OptimizationField {
    type Error = UnknownField;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OptimizationField> for String {
    fn from(field: OptimizationField) -> Self {
        field.to_string()
    }
}

/// A proposed single-field change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoOptimization {
    #[serde(rename = "type")]
    pub optimization_type: IssueType,
    pub field: OptimizationField,
    pub original: String,
    pub suggestion: String,
    #[serde(default)]
    pub applied: bool,
}

// =============================================================================
// Analysis result
// =============================================================================

/// Snapshot of one product's SEO health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoAnalysisResult {
    pub product_id: i64,
    pub title: String,
    pub handle: String,
    pub issues: Vec<SeoIssue>,
    pub score: u8,
    pub optimizations: Vec<SeoOptimization>,
}

impl SeoAnalysisResult {
    /// Optimizations that have not been written to the store yet.
    pub fn pending(&self) -> impl Iterator<Item = &SeoOptimization> {
        self.optimizations.iter().filter(|o| !o.applied)
    }

    /// Whether at least one optimization is still unapplied.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending().next().is_some()
    }

    /// Find the optimization for `field` proposing `suggestion`.
    #[must_use]
    pub fn find(&self, field: OptimizationField, suggestion: &str) -> Option<&SeoOptimization> {
        self.optimizations
            .iter()
            .find(|o| o.field == field && o.suggestion == suggestion)
    }

    /// Set the `applied` flag of the matching optimization.
    ///
    /// Returns `true` if a matching optimization was found.
    pub fn set_applied(
        &mut self,
        field: OptimizationField,
        suggestion: &str,
        applied: bool,
    ) -> bool {
        self.optimizations
            .iter_mut()
            .find(|o| o.field == field && o.suggestion == suggestion)
            .map(|o| o.applied = applied)
            .is_some()
    }
}

// =============================================================================
// Input snapshot
// =============================================================================

/// A product image as seen by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSnapshot {
    pub id: i64,
    pub position: u32,
    pub alt: Option<String>,
}

/// The product fields the analyzer inspects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: i64,
    pub title: String,
    pub handle: String,
    pub body_html: String,
    pub product_type: String,
    pub vendor: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub images: Vec<ImageSnapshot>,
}
