//! Claude API integration for generated SEO copy.
//!
//! Non-streaming calls to the Anthropic Messages API; the first text block of
//! the response is the generated content. Deadlines and fallbacks are applied
//! by [`ContentService`](crate::services::ContentService).

mod client;
pub mod types;

pub use client::ClaudeClient;
