//! Domain models for the storefront.
//!
//! These are validated domain objects returned by the repositories and
//! serialized by the JSON API. Database row types stay private to `db`.

pub mod cart;
pub mod catalog;
pub mod comment;
pub mod favorite;
pub mod session;
pub mod user;

pub use cart::{CartLine, CartView};
pub use catalog::{Category, NewCategory, Product, ProductFilter, ProductInput};
pub use comment::Comment;
pub use favorite::Favorite;
pub use session::CurrentUser;
pub use user::User;
