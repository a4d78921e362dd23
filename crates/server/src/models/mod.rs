//! Domain models persisted by the server.

pub mod analysis;
pub mod audit;
pub mod history;
pub mod profile;
pub mod store;

pub use analysis::StoredAnalysis;
pub use audit::{StoredAudit, WebsiteSeoAudit};
pub use history::{HistoryRecord, NewHistoryRecord, idempotency_key};
pub use profile::{Profile, SubscriptionUpdate};
pub use store::{NewStore, Store, StoreCredentials};
