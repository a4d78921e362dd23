//! HTTP middleware and extractors.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, outermost)
//! 2. `TraceLayer` (request tracing with status and latency)
//! 3. Security headers
//!
//! Authentication is an extractor ([`auth::RequireUser`]) rather than a layer
//! so health checks and the billing webhook stay public.

pub mod auth;
pub mod security_headers;

pub use auth::RequireUser;
