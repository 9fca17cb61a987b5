//! Core types for Litus.
//!
//! This module provides type-safe wrappers for the storefront's domain concepts.

pub mod cart;
pub mod id;
pub mod identity;
pub mod price;
pub mod quantity;
pub mod slug;
pub mod username;

pub use cart::{CartSummary, line_total};
pub use id::*;
pub use identity::{GuestToken, Identity};
pub use price::{Price, PriceError};
pub use quantity::{Quantity, QuantityChange, QuantityError};
pub use slug::{Slug, SlugError};
pub use username::{Username, UsernameError};
