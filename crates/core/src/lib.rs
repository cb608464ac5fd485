//! Corner Shop Core - Shared types library.
//!
//! This crate provides the domain newtypes used across Corner Shop components:
//! - `storefront` - Catalog, cart, checkout, payment and refund service
//! - `cli` - Command-line tools for migrations and shop administration
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. `sqlx` encodings are available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, money, slugs, emails, and catalog/payment enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
