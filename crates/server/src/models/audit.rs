//! Stored website audits.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopseo_core::audit::{AuditIssue, AuditMeta, AuditOptimization};
use shopseo_core::{AuditId, StoreId};

/// A scored audit snapshot, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebsiteSeoAudit {
    pub id: AuditId,
    pub store_id: StoreId,
    pub created_at: DateTime<Utc>,
    pub score: u8,
    pub issues: Vec<AuditIssue>,
    pub optimizations: Vec<AuditOptimization>,
    pub meta: AuditMeta,
    pub schema_version: i32,
}

/// An audit row before its payload is parsed.
///
/// Payloads written by older builds may need [`shopseo_core::audit::upgrade_payload`]
/// before they deserialize.
#[derive(Debug, Clone)]
pub struct StoredAudit {
    pub id: AuditId,
    pub store_id: StoreId,
    pub created_at: DateTime<Utc>,
    pub payload: serde_json::Value,
    pub schema_version: i32,
}
