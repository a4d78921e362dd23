//! Stripe webhook support.
//!
//! Only the pieces needed to keep profiles in sync with subscriptions:
//! signature verification and the event and subscription payloads.

mod signature;
pub mod types;

use thiserror::Error;

use crate::db::RepositoryError;

pub use signature::{SIGNATURE_TOLERANCE_SECS, sign_payload, verify_signature};
pub use types::{Event, Subscription};

/// Errors raised while handling a billing webhook.
#[derive(Debug, Error)]
pub enum BillingError {
    /// No `Stripe-Signature` header was sent.
    #[error("missing signature header")]
    MissingSignature,

    /// Signature did not verify.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Body could not be parsed.
    #[error("invalid payload: {0}")]
    Payload(String),

    /// Profile could not be updated.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),
}
