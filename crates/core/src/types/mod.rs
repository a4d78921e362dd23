//! Core types for shopseo.
//!
//! Type-safe wrappers for identifiers, store domains and persisted enums.

pub mod id;
pub mod shop_domain;
pub mod status;

pub use id::*;
pub use shop_domain::{MYSHOPIFY_SUFFIX, ShopDomain, ShopDomainError};
pub use status::*;
