//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPSEO_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `SHOPSEO_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOPSEO_PORT` - Listen port (default: 3002)
//! - `SHOPIFY_API_VERSION` - Admin REST API version (default: 2025-01)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (integrations, each disabled when unset)
//! - `ANTHROPIC_API_KEY` - Enables generated content
//! - `CONTENT_MODEL` - Claude model ID (default: claude-sonnet-4-20250514)
//! - `CONTENT_TIMEOUT_SECS` - Generation deadline (default: 20)
//! - `OPENAI_API_KEY` - Enables generated images
//! - `SERPAPI_API_KEY` - Enables search results
//! - `STRIPE_WEBHOOK_SECRET` - Enables the billing webhook
//! - `BILLING_PRICE_PLANS` - Price to plan map, e.g. `price_123=starter,price_456=agency`
//!
//! ## Optional (TLS)
//! - `SHOPSEO_TLS_CERT` - PEM-encoded certificate chain
//! - `SHOPSEO_TLS_KEY` - PEM-encoded private key

use std::collections::{BTreeMap, HashMap};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use shopseo_core::Plan;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_CONTENT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_CONTENT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_SHOPIFY_API_VERSION: &str = "2025-01";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shopify Admin REST API settings
    pub shopify: ShopifyConfig,
    /// Claude configuration for generated content (optional)
    pub content: Option<ContentConfig>,
    /// `OpenAI` configuration for generated images (optional)
    pub openai: Option<OpenAIConfig>,
    /// `SerpApi` configuration for search results (optional)
    pub search: Option<SearchConfig>,
    /// Stripe webhook configuration (optional)
    pub billing: Option<BillingConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Shopify Admin REST API settings.
///
/// Access tokens are per store and live in the database, not here.
#[derive(Debug, Clone)]
pub struct ShopifyConfig {
    /// Shopify API version (e.g., 2025-01)
    pub api_version: String,
}

/// Claude configuration for generated content.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ContentConfig {
    /// Anthropic API key
    pub api_key: SecretString,
    /// Model ID
    pub model: String,
    /// Deadline for one generation call
    pub timeout: Duration,
}

impl std::fmt::Debug for ContentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// `OpenAI` API configuration for image generation.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct OpenAIConfig {
    /// `OpenAI` API key
    pub api_key: SecretString,
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// `SerpApi` configuration.
#[derive(Clone)]
pub struct SearchConfig {
    /// `SerpApi` key
    pub api_key: SecretString,
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Stripe webhook configuration.
#[derive(Clone)]
pub struct BillingConfig {
    /// Webhook signing secret (`whsec_...`)
    pub webhook_secret: SecretString,
    /// Stripe price ID to plan
    pub price_plans: HashMap<String, Plan>,
}

impl std::fmt::Debug for BillingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingConfig")
            .field("webhook_secret", &"[REDACTED]")
            .field("price_plans", &self.price_plans)
            .finish()
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("SHOPSEO_TLS_CERT");
        let key_pem = get_optional_env("SHOPSEO_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "SHOPSEO_TLS_*".to_string(),
                "Both SHOPSEO_TLS_CERT and SHOPSEO_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if a configured secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = database_url_from_env()?;
        let host = get_env_or_default("SHOPSEO_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPSEO_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SHOPSEO_PORT", "3002")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPSEO_PORT".to_string(), e.to_string()))?;

        let shopify = ShopifyConfig {
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_SHOPIFY_API_VERSION),
        };
        let content = ContentConfig::from_env()?;
        let openai = OpenAIConfig::from_env()?;
        let search = SearchConfig::from_env()?;
        let billing = BillingConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            shopify,
            content,
            openai,
            search,
            billing,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ContentConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = secret_from_env("ANTHROPIC_API_KEY", true)? else {
            return Ok(None);
        };

        let timeout_secs = get_optional_env("CONTENT_TIMEOUT_SECS")
            .map(|s| {
                s.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar("CONTENT_TIMEOUT_SECS".to_string(), e.to_string())
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_CONTENT_TIMEOUT_SECS);

        Ok(Some(Self {
            api_key,
            model: get_env_or_default("CONTENT_MODEL", DEFAULT_CONTENT_MODEL),
            timeout: Duration::from_secs(timeout_secs),
        }))
    }
}

impl OpenAIConfig {
    /// `None` if `OPENAI_API_KEY` is not set (placeholder images only).
    fn from_env() -> Result<Option<Self>, ConfigError> {
        Ok(secret_from_env("OPENAI_API_KEY", false)?.map(|api_key| Self { api_key }))
    }
}

impl SearchConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        Ok(secret_from_env("SERPAPI_API_KEY", false)?.map(|api_key| Self { api_key }))
    }
}

impl BillingConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(webhook_secret) = secret_from_env("STRIPE_WEBHOOK_SECRET", true)? else {
            return Ok(None);
        };

        let price_plans = get_optional_env("BILLING_PRICE_PLANS")
            .map(|raw| parse_price_plans(&raw))
            .transpose()?
            .unwrap_or_default();

        Ok(Some(Self {
            webhook_secret,
            price_plans,
        }))
    }
}

/// Parse `price_a=starter,price_b=agency` into a price to plan map.
fn parse_price_plans(raw: &str) -> Result<HashMap<String, Plan>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (price, plan) = entry.split_once('=').ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "BILLING_PRICE_PLANS".to_string(),
                    format!("expected price=plan, got '{entry}'"),
                )
            })?;
            let plan = plan.trim().parse::<Plan>().map_err(|e| {
                ConfigError::InvalidEnvVar("BILLING_PRICE_PLANS".to_string(), e.to_string())
            })?;
            Ok((price.trim().to_string(), plan))
        })
        .collect()
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Database URL from `SHOPSEO_DATABASE_URL`, falling back to the generic
/// `DATABASE_URL` (used by Fly.io postgres attach).
///
/// Used alone by CLI commands that need no other configuration.
///
/// # Errors
///
/// Returns `MissingEnvVar` if neither variable is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    const PRIMARY_KEY: &str = "SHOPSEO_DATABASE_URL";

    if let Ok(value) = std::env::var(PRIMARY_KEY) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(PRIMARY_KEY.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Read an optional secret, rejecting placeholders and low-entropy values.
///
/// When `strict` is false a weak value is only logged.
fn secret_from_env(key: &str, strict: bool) -> Result<Option<SecretString>, ConfigError> {
    let Some(value) = get_optional_env(key) else {
        return Ok(None);
    };
    match weak_secret_reason(&value) {
        None => {}
        Some(reason) if strict => return Err(ConfigError::InsecureSecret(key.to_string(), reason)),
        Some(reason) => tracing::warn!(var = key, "Weak secret: {reason}"),
    }
    Ok(Some(SecretString::from(value)))
}

/// Why `secret` is unsafe to use, if it is.
fn weak_secret_reason(secret: &str) -> Option<String> {
    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return Some(format!("looks like a placeholder (contains '{pattern}')"));
    }

    let bits = entropy_bits_per_char(secret);
    (bits < MIN_ENTROPY_BITS_PER_CHAR).then(|| {
        format!(
            "only {bits:.2} bits of entropy per character, need {MIN_ENTROPY_BITS_PER_CHAR:.1}; \
             use a randomly generated value"
        )
    })
}

/// Shannon entropy of `s` in bits per character.
fn entropy_bits_per_char(s: &str) -> f64 {
    let mut counts: BTreeMap<char, u32> = BTreeMap::new();
    let mut total = 0u32;
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = f64::from(total);
    counts
        .values()
        .map(|&n| {
            let p = f64::from(n) / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_bits_per_char() {
        assert!(entropy_bits_per_char("").abs() < f64::EPSILON);
        assert!((entropy_bits_per_char("abab") - 1.0).abs() < 0.01);
        assert!((entropy_bits_per_char("abcd") - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_weak_secrets_are_explained() {
        let reason = weak_secret_reason("sk-your-key-here").unwrap();
        assert!(reason.contains("placeholder"));

        let reason = weak_secret_reason("whsec_0000000000000000000000").unwrap();
        assert!(reason.contains("entropy"));

        assert_eq!(weak_secret_reason("whsec_9fK2qL7xZp4VbN8mR3tY6wC1hJ5d"), None);
    }

    #[test]
    fn test_parse_price_plans() {
        let plans = parse_price_plans("price_1=starter, price_2=agency,").unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans.get("price_1"), Some(&Plan::Starter));
        assert_eq!(plans.get("price_2"), Some(&Plan::Agency));
    }

    #[test]
    fn test_parse_price_plans_rejects_bad_entries() {
        assert!(parse_price_plans("price_1").is_err());
        assert!(parse_price_plans("price_1=enterprise").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3002,
            shopify: ShopifyConfig {
                api_version: DEFAULT_SHOPIFY_API_VERSION.to_string(),
            },
            content: None,
            openai: None,
            search: None,
            billing: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
            tls: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3002);
    }

    #[test]
    fn test_content_config_debug_redacts_secrets() {
        let config = ContentConfig {
            api_key: SecretString::from("sk-ant-super-secret-key"),
            model: DEFAULT_CONTENT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_CONTENT_TIMEOUT_SECS),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains(DEFAULT_CONTENT_MODEL));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk-ant-super-secret-key"));
    }

    #[test]
    fn test_billing_config_debug_redacts_secrets() {
        let config = BillingConfig {
            webhook_secret: SecretString::from("whsec_topsecretvalue"),
            price_plans: HashMap::new(),
        };
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("whsec_topsecretvalue"));
    }
}
