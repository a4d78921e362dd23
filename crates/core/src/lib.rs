//! Shopseo Core - Shared types and pure SEO logic.
//!
//! This crate is used by:
//! - `server` - HTTP API for store connections, analysis, optimization and audits
//! - `cli` - Command-line tools for migrations and maintenance
//!
//! # Architecture
//!
//! The core crate contains types and pure functions only: no database access
//! and no HTTP clients. Everything here is deterministic except the UUIDs
//! minted for audit findings.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, shop domains and persisted status enums
//! - [`seo`] - Per-product analyzer, issues and optimizations
//! - [`audit`] - Store-wide audit rules and payload schema upgrades

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod audit;
pub mod seo;
pub mod types;

pub use types::*;
