//! Litus Core - Shared domain types.
//!
//! This crate provides the types used across all Litus components:
//! - `storefront` - Public storefront and admin JSON API
//! - `cli` - Command-line tools for schema evolution, seeding, and admin users
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Validation of user input happens here so every layer agrees
//! on what a valid price, quantity, slug, or username is.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, identities, prices, quantities, slugs, and cart totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
