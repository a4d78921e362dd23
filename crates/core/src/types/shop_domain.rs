//! Shopify store domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Suffix carried by every Shopify-hosted store domain.
pub const MYSHOPIFY_SUFFIX: &str = ".myshopify.com";

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty after trimming.
    #[error("store URL cannot be empty")]
    Empty,
    /// The shop name is longer than a DNS label allows.
    #[error("store name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The shop name contains characters outside `[a-zA-Z0-9-]` or starts/ends with `-`.
    #[error("invalid store name '{0}': use letters, digits and inner hyphens only")]
    InvalidName(String),
}

/// A normalized `<name>.myshopify.com` store domain.
///
/// ## Normalization
///
/// - Leading/trailing whitespace is removed
/// - `http://` and `https://` schemes are stripped
/// - Anything after the host (path, query, fragment, port) is dropped
/// - The host is lowercased
/// - `.myshopify.com` is appended when missing
///
/// The shop name (host without the suffix) must match
/// `^[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]$`.
///
/// ## Examples
///
/// ```
/// use shopseo_core::ShopDomain;
///
/// let domain = ShopDomain::parse("https://Acme-Goods.myshopify.com/admin").unwrap();
/// assert_eq!(domain.as_str(), "acme-goods.myshopify.com");
///
/// let domain = ShopDomain::parse("acme-goods").unwrap();
/// assert_eq!(domain.as_str(), "acme-goods.myshopify.com");
///
/// assert!(ShopDomain::parse("-acme").is_err());
/// assert!(ShopDomain::parse("acme.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Maximum length of the shop name (a single DNS label).
    pub const MAX_NAME_LENGTH: usize = 63;

    /// Parse and normalize a store URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, the shop name is too long, or
    /// the shop name contains characters that are not allowed.
    pub fn parse(input: &str) -> Result<Self, ShopDomainError> {
        let trimmed = input.trim();
        let without_scheme = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);

        let host = without_scheme
            .split(['/', '?', '#', ':'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        if host.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        let name = host.strip_suffix(MYSHOPIFY_SUFFIX).unwrap_or(&host);

        if name.len() > Self::MAX_NAME_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_NAME_LENGTH,
            });
        }

        if !is_valid_shop_name(name) {
            return Err(ShopDomainError::InvalidName(name.to_string()));
        }

        Ok(Self(format!("{name}{MYSHOPIFY_SUFFIX}")))
    }

    /// Returns the full domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the shop name without the `.myshopify.com` suffix.
    #[must_use]
    pub fn shop_name(&self) -> &str {
        self.0.strip_suffix(MYSHOPIFY_SUFFIX).unwrap_or(&self.0)
    }

    /// Consumes the domain and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// `^[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]$`
fn is_valid_shop_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };

    bytes.len() >= 2
        && first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopDomain> for String {
    fn from(domain: ShopDomain) -> Self {
        domain.0
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn appends_suffix_when_missing() {
        for (input, expected) in [
            ("acme", "acme.myshopify.com"),
            ("Acme-Goods", "acme-goods.myshopify.com"),
            ("https://acme", "acme.myshopify.com"),
            ("  store42  ", "store42.myshopify.com"),
        ] {
            assert_eq!(ShopDomain::parse(input).unwrap().as_str(), expected);
        }
    }

    #[test]
    fn keeps_existing_suffix() {
        for input in [
            "acme.myshopify.com",
            "https://acme.myshopify.com",
            "http://acme.myshopify.com/",
            "acme.myshopify.com/admin/products?x=1",
            "ACME.MYSHOPIFY.COM",
        ] {
            assert_eq!(
                ShopDomain::parse(input).unwrap().as_str(),
                "acme.myshopify.com"
            );
        }
    }

    #[test]
    fn rejects_invalid_names() {
        assert_eq!(ShopDomain::parse(""), Err(ShopDomainError::Empty));
        assert_eq!(ShopDomain::parse("https://"), Err(ShopDomainError::Empty));
        assert!(matches!(
            ShopDomain::parse("-acme"),
            Err(ShopDomainError::InvalidName(_))
        ));
        assert!(matches!(
            ShopDomain::parse("acme-"),
            Err(ShopDomainError::InvalidName(_))
        ));
        assert!(matches!(
            ShopDomain::parse("acme.com"),
            Err(ShopDomainError::InvalidName(_))
        ));
        assert!(matches!(
            ShopDomain::parse("a"),
            Err(ShopDomainError::InvalidName(_))
        ));
        assert!(matches!(
            ShopDomain::parse("acme_store"),
            Err(ShopDomainError::InvalidName(_))
        ));
    }

    #[test]
    fn rejects_overlong_names() {
        let long = "a".repeat(64);
        assert_eq!(
            ShopDomain::parse(&long),
            Err(ShopDomainError::TooLong { max: 63 })
        );
    }

    #[test]
    fn shop_name_strips_suffix() {
        let domain = ShopDomain::parse("acme").unwrap();
        assert_eq!(domain.shop_name(), "acme");
    }

    #[test]
    fn deserialize_normalizes() {
        let domain: ShopDomain = serde_json::from_str("\"https://acme/\"").unwrap();
        assert_eq!(domain.as_str(), "acme.myshopify.com");
        assert!(serde_json::from_str::<ShopDomain>("\"bad name\"").is_err());
    }
}
