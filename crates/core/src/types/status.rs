//! Status and kind enums shared across components.
//!
//! All of these are persisted as `TEXT` columns; `Display`/`FromStr` give the
//! canonical snake_case spelling used both in the database and in JSON.

use serde::{Deserialize, Serialize};

/// Error returned when a stored or submitted enum value is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct UnknownVariant {
    /// Name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Canonical text representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

/// Kind of remote Shopify resource an optimization writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Product,
    Page,
    Blog,
}

text_enum!(EntityType, "entity type", {
    Product => "product",
    Page => "page",
    Blog => "blog",
});

/// Subscription plan attached to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Free,
    Starter,
    Professional,
    Agency,
}

text_enum!(Plan, "plan", {
    Free => "free",
    Starter => "starter",
    Professional => "professional",
    Agency => "agency",
});

/// Billing provider subscription status.
///
/// Mirrors the provider's lifecycle states; unknown states are rejected at the
/// webhook boundary rather than stored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trialing,
    Active,
    PastDue,
    Canceled,
    Unpaid,
    Incomplete,
    IncompleteExpired,
    Paused,
}

text_enum!(SubscriptionStatus, "subscription status", {
    Trialing => "trialing",
    Active => "active",
    PastDue => "past_due",
    Canceled => "canceled",
    Unpaid => "unpaid",
    Incomplete => "incomplete",
    IncompleteExpired => "incomplete_expired",
    Paused => "paused",
});

impl SubscriptionStatus {
    /// Whether the subscription currently grants paid features.
    #[must_use]
    pub const fn grants_access(&self) -> bool {
        matches!(self, Self::Trialing | Self::Active | Self::PastDue)
    }
}
