//! Database operations for the storefront `PostgreSQL`.
//!
//! # Schema: `shop`
//!
//! ## Tables
//!
//! - `category` - Product categories (unique slug)
//! - `product` - Catalog products, like counters
//! - `comment` - Append-only product comments, optionally attributed to a customer
//! - `customer` - Accounts (argon2 password hash, admin flag)
//! - `cart_line` - One row per (owner, product); owner is a customer or a guest token
//! - `favorite` - One row per (owner, product)
//!
//! Sessions live in the `tower_sessions` schema managed by the session store.
//!
//! # Evolution
//!
//! Migrations are stored in `crates/storefront/migrations/` and applied, together
//! with the optional-column evolution step, by [`schema::SchemaStore::evolve`].
//! The storefront runs it once at startup; it can also be run explicitly:
//! ```bash
//! cargo run -p litus-cli -- migrate
//! ```

pub mod cart;
pub mod catalog;
pub mod comments;
pub mod favorites;
pub mod retry;
pub mod schema;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::CartRepository;
pub use catalog::CatalogRepository;
pub use comments::CommentRepository;
pub use favorites::FavoriteRepository;
pub use retry::{Replay, StoragePolicy};
pub use schema::{SchemaReport, SchemaStore};
pub use users::UserRepository;

/// SQL predicate matching rows owned by the identity bound as `$1` (user id)
/// and `$2` (guest token). Exactly one of the two binds is non-NULL, so the
/// other comparison is NULL and drops out of the `OR`.
pub(crate) const OWNER_MATCHES: &str = "(user_id = $1 OR guest_token = $2)";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique slug).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Storage did not answer in time after all allowed attempts.
    #[error("storage unavailable during {operation} after {attempts} attempt(s)")]
    Unavailable {
        /// Name of the storage operation.
        operation: &'static str,
        /// Attempts made, including the first.
        attempts: u32,
    },
}

impl RepositoryError {
    /// Whether the failure is transient and the call may succeed if repeated.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Database(err) => match err {
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => true,
                sqlx::Error::Database(db_err) => db_err
                    .code()
                    .is_some_and(|code| is_transient_sqlstate(&code)),
                _ => false,
            },
            Self::Unavailable { .. } => true,
            _ => false,
        }
    }

    /// Whether the failed call is known not to have committed anything, so it
    /// can be repeated even when it is not idempotent.
    #[must_use]
    pub fn is_safe_to_replay(&self) -> bool {
        match self {
            Self::Database(sqlx::Error::PoolTimedOut) => true,
            Self::Database(sqlx::Error::Database(db_err)) => db_err
                .code()
                .is_some_and(|code| matches!(code.as_ref(), "40001" | "40P01")),
            _ => false,
        }
    }
}

/// Serialization failures, deadlocks, connection exceptions, and shutdowns.
fn is_transient_sqlstate(code: &str) -> bool {
    matches!(code, "40001" | "40P01" | "57P01" | "57P03") || code.starts_with("08")
}

/// Map a unique violation to `Conflict`, a foreign key violation to
/// `NotFound`, and anything else to `Database`.
pub(crate) fn classify_write_error(err: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(err)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_transient_and_replayable() {
        let err = RepositoryError::Database(sqlx::Error::PoolTimedOut);
        assert!(err.is_transient());
        assert!(err.is_safe_to_replay());
    }

    #[test]
    fn test_io_error_is_transient_but_not_replayable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = RepositoryError::Database(sqlx::Error::Io(io));
        assert!(err.is_transient());
        assert!(!err.is_safe_to_replay());
    }

    #[test]
    fn test_domain_errors_are_not_transient() {
        assert!(!RepositoryError::NotFound.is_transient());
        assert!(!RepositoryError::Conflict("slug".into()).is_transient());
        assert!(!RepositoryError::Database(sqlx::Error::RowNotFound).is_transient());
    }

    #[test]
    fn test_transient_sqlstates() {
        assert!(is_transient_sqlstate("40001"));
        assert!(is_transient_sqlstate("40P01"));
        assert!(is_transient_sqlstate("08006"));
        assert!(!is_transient_sqlstate("23505"));
    }
}
