//! Cart-owning identities.
//!
//! Every per-shopper collection (cart lines, favorites, comment attribution) is
//! keyed by an [`Identity`]. A request resolves to exactly one of:
//!
//! - [`Identity::Customer`] - a logged-in account, durable across sessions
//! - [`Identity::Guest`] - an anonymous visitor, scoped to one server-side session
//!
//! The two variants are never conflated: a guest's cart is not silently merged
//! into a customer's cart when they log in.
//!
//! ## Guest tokens
//!
//! Guest tokens are UUID v4 values (122 random bits) minted by the server and
//! stored in the server-side session. They are never accepted from request
//! input, so a collision requires two independently minted tokens to match;
//! no collision detection is performed.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::UserId;

/// An anonymous, session-scoped owner token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestToken(Uuid);

impl GuestToken {
    /// Mint a fresh random token.
    #[must_use]
    pub fn mint() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID (e.g. one read back from the session store).
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for GuestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The principal that owns a cart, a favorites set, and comment attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    /// A logged-in customer account.
    Customer {
        /// The account's user id.
        user_id: UserId,
    },
    /// An anonymous visitor with a session-scoped token.
    Guest {
        /// The server-minted guest token.
        token: GuestToken,
    },
}

impl Identity {
    /// Identity for a logged-in customer.
    #[must_use]
    pub const fn customer(user_id: UserId) -> Self {
        Self::Customer { user_id }
    }

    /// Identity for a guest.
    #[must_use]
    pub const fn guest(token: GuestToken) -> Self {
        Self::Guest { token }
    }

    /// The customer's user id, if this is a customer identity.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Customer { user_id } => Some(*user_id),
            Self::Guest { .. } => None,
        }
    }

    /// The guest token, if this is a guest identity.
    #[must_use]
    pub const fn guest_token(&self) -> Option<GuestToken> {
        match self {
            Self::Customer { .. } => None,
            Self::Guest { token } => Some(*token),
        }
    }

    /// Whether this identity belongs to a logged-in customer.
    #[must_use]
    pub const fn is_customer(&self) -> bool {
        matches!(self, Self::Customer { .. })
    }

    /// The owner columns as stored in the database: `(user_id, guest_token)`.
    ///
    /// Exactly one of the two is `Some`.
    #[must_use]
    pub fn owner_columns(&self) -> (Option<i32>, Option<Uuid>) {
        (
            self.user_id().map(|id| id.as_i32()),
            self.guest_token().map(|t| t.as_uuid()),
        )
    }

    /// Rebuild an identity from stored owner columns.
    ///
    /// Returns `None` if neither or both columns are set.
    #[must_use]
    pub fn from_owner_columns(user_id: Option<i32>, guest_token: Option<Uuid>) -> Option<Self> {
        match (user_id, guest_token) {
            (Some(id), None) => Some(Self::customer(UserId::new(id))),
            (None, Some(token)) => Some(Self::guest(GuestToken::from_uuid(token))),
            _ => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer { user_id } => write!(f, "customer:{user_id}"),
            Self::Guest { token } => write!(f, "guest:{token}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_tokens_differ() {
        assert_ne!(GuestToken::mint(), GuestToken::mint());
    }

    #[test]
    fn test_owner_columns_exactly_one_set() {
        let customer = Identity::customer(UserId::new(5));
        assert_eq!(customer.owner_columns(), (Some(5), None));

        let token = GuestToken::mint();
        let guest = Identity::guest(token);
        assert_eq!(guest.owner_columns(), (None, Some(token.as_uuid())));
    }

    #[test]
    fn test_from_owner_columns_rejects_ambiguous_rows() {
        let uuid = Uuid::new_v4();
        assert_eq!(Identity::from_owner_columns(None, None), None);
        assert_eq!(Identity::from_owner_columns(Some(1), Some(uuid)), None);
        assert_eq!(
            Identity::from_owner_columns(Some(1), None),
            Some(Identity::customer(UserId::new(1)))
        );
        assert_eq!(
            Identity::from_owner_columns(None, Some(uuid)),
            Some(Identity::guest(GuestToken::from_uuid(uuid)))
        );
    }

    #[test]
    fn test_customer_and_guest_never_equal() {
        let guest = Identity::guest(GuestToken::mint());
        let customer = Identity::customer(UserId::new(1));
        assert_ne!(guest, customer);
        assert!(customer.is_customer());
        assert!(!guest.is_customer());
    }

    #[test]
    fn test_display() {
        assert_eq!(Identity::customer(UserId::new(12)).to_string(), "customer:12");
        let uuid = Uuid::nil();
        assert_eq!(
            Identity::guest(GuestToken::from_uuid(uuid)).to_string(),
            format!("guest:{uuid}")
        );
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_value(Identity::customer(UserId::new(4))).unwrap();
        assert_eq!(json["kind"], "customer");
        assert_eq!(json["user_id"], 4);
    }
}
