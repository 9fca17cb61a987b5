//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `identity` - Session to customer/guest identity
//! - `cart` - Cart ledger
//! - `favorites` - Favorites set
//! - `comments` - Comment log
//! - `catalog` - Catalog reads, likes, and admin changes
//! - `media` - Product image files
//! - `auth` - Customer accounts
//! - `contact` - Contact form
//!
//! Every storage call made by a service goes through the configured
//! [`StoragePolicy`](crate::db::StoragePolicy).

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod comments;
pub mod contact;
mod error;
pub mod favorites;
pub mod identity;
pub mod media;

pub use auth::{AuthError, AuthService};
pub use cart::{CartLedger, LineChange};
pub use catalog::{CatalogService, CategoryCache, HOME_SECTION_LIMIT, HomePage};
pub use comments::CommentLog;
pub use contact::{ContactMessage, submit_contact};
pub use error::ShopError;
pub use favorites::FavoritesSet;
pub use identity::{IdentityResolver, IdentitySession};
pub use media::MediaStore;
