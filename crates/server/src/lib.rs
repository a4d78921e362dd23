//! Shopseo server library.
//!
//! The HTTP API for connecting Shopify stores, analyzing and optimizing
//! product SEO, reverting changes and auditing whole sites. Exposed as a
//! library so the CLI and integration tests share the same services.
//!
//! # Security
//!
//! Stores hold Shopify Admin API tokens with write access. Tokens are kept in
//! [`secrecy::SecretString`] once loaded and never serialized in responses.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod claude;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod openai;
pub mod routes;
pub mod serpapi;
pub mod services;
pub mod shopify;
pub mod state;
pub mod stripe;
