//! Error type shared by the ledger and catalog services.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors surfaced by cart, favorites, comments, and catalog operations.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Input failed validation. Never retried.
    #[error("{0}")]
    Validation(String),

    /// The operation needs a logged-in customer.
    #[error("login required")]
    Unauthenticated,

    /// The target belongs to a different identity.
    #[error("this item belongs to someone else")]
    NotOwner,

    /// The customer lacks the admin flag.
    #[error("admin access required")]
    Forbidden,

    /// The referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The entity is still referenced and cannot be deleted.
    #[error("{0}")]
    ReferentialConflict(String),

    /// A unique value is already taken.
    #[error("{0}")]
    Conflict(String),

    /// Storage did not respond within the retry budget. Safe to retry later.
    #[error("storage temporarily unavailable")]
    StorageUnavailable,

    /// Reading or writing the session failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Storing or removing a product image failed.
    #[error("media error: {0}")]
    Media(#[from] std::io::Error),

    /// Any other repository failure.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl ShopError {
    /// Map a repository error, naming the entity for `NotFound`.
    #[must_use]
    pub fn from_repository(err: RepositoryError, entity: &'static str) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound(entity),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::Unavailable { .. } => Self::StorageUnavailable,
            other => Self::Repository(other),
        }
    }

    /// Whether the error is the server's fault (reported to Sentry).
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Session(_) | Self::Media(_) | Self::Repository(_) | Self::StorageUnavailable
        )
    }
}

impl From<RepositoryError> for ShopError {
    fn from(err: RepositoryError) -> Self {
        Self::from_repository(err, "resource")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_mapping() {
        assert!(matches!(
            ShopError::from_repository(RepositoryError::NotFound, "product"),
            ShopError::NotFound("product")
        ));
        assert!(matches!(
            ShopError::from(RepositoryError::Unavailable {
                operation: "cart.list_lines",
                attempts: 3
            }),
            ShopError::StorageUnavailable
        ));
        assert!(matches!(
            ShopError::from(RepositoryError::Conflict("slug taken".into())),
            ShopError::Conflict(_)
        ));
    }

    #[test]
    fn test_not_found_message_names_entity() {
        assert_eq!(ShopError::NotFound("cart line").to_string(), "cart line not found");
    }

    #[test]
    fn test_client_errors_are_not_server_errors() {
        assert!(!ShopError::Validation("x".into()).is_server_error());
        assert!(!ShopError::NotOwner.is_server_error());
        assert!(ShopError::StorageUnavailable.is_server_error());
    }
}
