//! Store-wide SEO audit.
//!
//! An audit is a point-in-time snapshot, independent of per-product analysis.
//! [`run_audit`] scores a [`SiteSnapshot`] across six categories; the stored
//! JSON payload is versioned and older payloads are brought forward with
//! [`upgrade_payload`].

mod rules;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::seo::{ProductSnapshot, Severity};

pub use rules::run_audit;

/// Current audit payload schema.
///
/// - v1: issues and optimizations had no `id`
/// - v2: every issue and optimization carries a UUID `id`
pub const AUDIT_SCHEMA_VERSION: i32 = 2;

/// Audit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditCategory {
    Meta,
    Structure,
    Content,
    Performance,
    Mobile,
    Security,
}

/// A store-wide finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditIssue {
    pub id: Uuid,
    pub category: AuditCategory,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub impact_score: u8,
    #[serde(default)]
    pub affected: u32,
}

/// Advice paired with an audit issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditOptimization {
    pub id: Uuid,
    pub category: AuditCategory,
    pub title: String,
    pub description: String,
    pub impact_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<Uuid>,
}

/// Entity counts captured when the audit ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditMeta {
    pub pages_count: u32,
    pub blogs_count: u32,
    pub articles_count: u32,
    pub products_count: u32,
}

/// Scored result of one audit run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFindings {
    pub score: u8,
    pub issues: Vec<AuditIssue>,
    pub optimizations: Vec<AuditOptimization>,
    pub meta: AuditMeta,
}

// =============================================================================
// Input snapshot
// =============================================================================

/// Shop-level settings relevant to the audit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSnapshot {
    pub name: String,
    pub primary_domain: String,
    pub password_enabled: bool,
}

/// An online-store page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub id: i64,
    pub title: String,
    pub handle: String,
    pub body_html: String,
    pub meta_description: Option<String>,
}

/// Everything the audit rules look at.
///
/// `products` may be a sample; `products_count` is the store total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSnapshot {
    pub shop: ShopSnapshot,
    pub pages: Vec<PageSnapshot>,
    pub blogs_count: u32,
    pub articles_count: u32,
    pub products_count: u32,
    pub products: Vec<ProductSnapshot>,
}

// =============================================================================
// Schema upgrades
// =============================================================================

/// Errors raised while upgrading a stored audit payload.
#[derive(Debug, thiserror::Error)]
pub enum AuditUpgradeError {
    /// The payload was written by a newer schema than this build understands.
    #[error("audit schema version {0} is newer than supported version {AUDIT_SCHEMA_VERSION}")]
    UnsupportedVersion(i32),
    /// The payload is not a JSON object.
    #[error("audit payload is not an object")]
    NotAnObject,
}

/// Bring a stored payload from `version` up to [`AUDIT_SCHEMA_VERSION`] in place.
///
/// Returns `true` if the payload changed and should be written back.
///
/// # Errors
///
/// Returns an error if `version` is newer than this build or the payload is
/// not a JSON object.
pub fn upgrade_payload(
    payload: &mut serde_json::Value,
    version: i32,
) -> Result<bool, AuditUpgradeError> {
    if version > AUDIT_SCHEMA_VERSION {
        return Err(AuditUpgradeError::UnsupportedVersion(version));
    }
    let object = payload
        .as_object_mut()
        .ok_or(AuditUpgradeError::NotAnObject)?;

    let mut changed = false;
    if version < 2 {
        for key in ["issues", "optimizations"] {
            let Some(entries) = object.get_mut(key).and_then(|v| v.as_array_mut()) else {
                continue;
            };
            for entry in entries.iter_mut().filter_map(|e| e.as_object_mut()) {
                let missing = entry.get("id").is_none_or(serde_json::Value::is_null);
                if missing {
                    entry.insert(
                        "id".to_string(),
                        serde_json::Value::String(Uuid::new_v4().to_string()),
                    );
                    changed = true;
                }
            }
        }
    }

    Ok(changed || version < AUDIT_SCHEMA_VERSION)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v1_payload() -> serde_json::Value {
        json!({
            "score": 72,
            "issues": [
                {"category": "meta", "severity": "high", "title": "t", "description": "d", "impact_score": 15},
                {"id": "6f1c2b7e-8d33-4a57-9a43-0b0f7c9b1d11", "category": "content", "severity": "low",
                 "title": "t2", "description": "d2", "impact_score": 3}
            ],
            "optimizations": [
                {"category": "meta", "title": "o", "description": "d", "impact_score": 15}
            ],
            "meta": {"pages_count": 1, "blogs_count": 0, "articles_count": 0, "products_count": 4}
        })
    }

    #[test]
    fn test_upgrade_assigns_missing_ids() {
        let mut payload = v1_payload();
        let changed = upgrade_payload(&mut payload, 1).unwrap();
        assert!(changed);

        let findings: AuditFindings = serde_json::from_value(payload).unwrap();
        assert_eq!(findings.issues.len(), 2);
        assert_eq!(
            findings.issues[1].id.to_string(),
            "6f1c2b7e-8d33-4a57-9a43-0b0f7c9b1d11"
        );
        assert_ne!(findings.issues[0].id, findings.optimizations[0].id);
    }

    #[test]
    fn test_v1_payload_does_not_parse_without_upgrade() {
        assert!(serde_json::from_value::<AuditFindings>(v1_payload()).is_err());
    }

    #[test]
    fn test_current_version_is_untouched() {
        let mut payload = v1_payload();
        upgrade_payload(&mut payload, 1).unwrap();
        let before = payload.clone();
        assert!(!upgrade_payload(&mut payload, AUDIT_SCHEMA_VERSION).unwrap());
        assert_eq!(payload, before);
    }

    #[test]
    fn test_future_version_is_rejected() {
        let mut payload = v1_payload();
        assert!(matches!(
            upgrade_payload(&mut payload, AUDIT_SCHEMA_VERSION + 1),
            Err(AuditUpgradeError::UnsupportedVersion(_))
        ));
    }
}
