//! Identity resolution: session state to [`Identity`].
//!
//! A logged-in customer always wins. Anonymous visitors get a guest token that
//! is minted on first use and kept in the server-side session, so it is stable
//! for the session's lifetime. Logging in does not merge the guest's cart or
//! favorites into the customer's; after logout the guest collections are
//! visible again.

use std::future::Future;

use tower_sessions::Session;

use litus_core::{GuestToken, Identity};

use super::ShopError;
use crate::models::CurrentUser;
use crate::models::session::keys;

/// The session operations identity resolution needs.
pub trait IdentitySession: Send + Sync {
    /// The logged-in customer, if any.
    fn current_user(&self) -> impl Future<Output = Result<Option<CurrentUser>, ShopError>> + Send;

    /// The session's guest token, if one was minted.
    fn guest_token(&self) -> impl Future<Output = Result<Option<GuestToken>, ShopError>> + Send;

    /// Persist a freshly minted guest token.
    fn store_guest_token(
        &self,
        token: GuestToken,
    ) -> impl Future<Output = Result<(), ShopError>> + Send;
}

impl IdentitySession for Session {
    async fn current_user(&self) -> Result<Option<CurrentUser>, ShopError> {
        Ok(self.get::<CurrentUser>(keys::CURRENT_USER).await?)
    }

    async fn guest_token(&self) -> Result<Option<GuestToken>, ShopError> {
        Ok(self.get::<GuestToken>(keys::GUEST_TOKEN).await?)
    }

    async fn store_guest_token(&self, token: GuestToken) -> Result<(), ShopError> {
        self.insert(keys::GUEST_TOKEN, token).await?;
        Ok(())
    }
}

/// Maps sessions onto identities under the configured guest policy.
#[derive(Debug, Clone, Copy)]
pub struct IdentityResolver {
    allow_guests: bool,
}

impl IdentityResolver {
    /// Create a resolver. With `allow_guests` false, cart and favorites
    /// require a logged-in customer.
    #[must_use]
    pub const fn new(allow_guests: bool) -> Self {
        Self { allow_guests }
    }

    /// Whether anonymous visitors may own carts and favorites.
    #[must_use]
    pub const fn allows_guests(&self) -> bool {
        self.allow_guests
    }

    /// Resolve the identity that owns the request's cart and favorites,
    /// minting a guest token on first anonymous access.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Unauthenticated` for anonymous requests when
    /// guests are not allowed, or `ShopError::Session` if the session store
    /// fails.
    pub async fn resolve<S: IdentitySession>(&self, session: &S) -> Result<Identity, ShopError> {
        if let Some(user) = session.current_user().await? {
            return Ok(Identity::customer(user.id));
        }
        if !self.allow_guests {
            return Err(ShopError::Unauthenticated);
        }
        if let Some(token) = session.guest_token().await? {
            return Ok(Identity::guest(token));
        }

        let token = GuestToken::mint();
        session.store_guest_token(token).await?;
        tracing::debug!(%token, "Minted guest token");
        Ok(Identity::guest(token))
    }

    /// The request's identity if it already has one, without minting.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Session` if the session store fails.
    pub async fn peek<S: IdentitySession>(
        &self,
        session: &S,
    ) -> Result<Option<Identity>, ShopError> {
        if let Some(user) = session.current_user().await? {
            return Ok(Some(Identity::customer(user.id)));
        }
        if !self.allow_guests {
            return Ok(None);
        }
        Ok(session.guest_token().await?.map(Identity::guest))
    }

    /// The logged-in customer.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Unauthenticated` if nobody is logged in.
    pub async fn require_customer<S: IdentitySession>(
        &self,
        session: &S,
    ) -> Result<CurrentUser, ShopError> {
        session
            .current_user()
            .await?
            .ok_or(ShopError::Unauthenticated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use litus_core::{UserId, Username};

    use super::*;

    /// In-memory session used in place of `tower_sessions::Session`.
    #[derive(Default)]
    pub(crate) struct FakeSession {
        pub user: Mutex<Option<CurrentUser>>,
        pub token: Mutex<Option<GuestToken>>,
        pub stores: Mutex<u32>,
    }

    impl FakeSession {
        pub(crate) fn logged_in(id: i32) -> Self {
            let session = Self::default();
            *session.user.lock().unwrap() = Some(CurrentUser {
                id: UserId::new(id),
                username: Username::parse("deniz").unwrap(),
                is_admin: false,
            });
            session
        }
    }

    impl IdentitySession for FakeSession {
        async fn current_user(&self) -> Result<Option<CurrentUser>, ShopError> {
            Ok(self.user.lock().unwrap().clone())
        }

        async fn guest_token(&self) -> Result<Option<GuestToken>, ShopError> {
            Ok(*self.token.lock().unwrap())
        }

        async fn store_guest_token(&self, token: GuestToken) -> Result<(), ShopError> {
            *self.token.lock().unwrap() = Some(token);
            *self.stores.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_customer_wins() {
        let session = FakeSession::logged_in(7);
        let identity = IdentityResolver::new(true).resolve(&session).await.unwrap();
        assert_eq!(identity, Identity::customer(UserId::new(7)));
        assert!(session.token.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_guest_token_minted_once_and_stable() {
        let session = FakeSession::default();
        let resolver = IdentityResolver::new(true);

        let first = resolver.resolve(&session).await.unwrap();
        let second = resolver.resolve(&session).await.unwrap();

        assert!(!first.is_customer());
        assert_eq!(first, second);
        assert_eq!(*session.stores.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_guests_disallowed() {
        let session = FakeSession::default();
        let result = IdentityResolver::new(false).resolve(&session).await;
        assert!(matches!(result, Err(ShopError::Unauthenticated)));
        assert!(session.token.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_does_not_discard_guest_token() {
        let session = FakeSession::default();
        let resolver = IdentityResolver::new(true);
        let guest = resolver.resolve(&session).await.unwrap();

        *session.user.lock().unwrap() = Some(CurrentUser {
            id: UserId::new(3),
            username: Username::parse("ayse").unwrap(),
            is_admin: false,
        });
        assert_eq!(
            resolver.resolve(&session).await.unwrap(),
            Identity::customer(UserId::new(3))
        );

        *session.user.lock().unwrap() = None;
        assert_eq!(resolver.resolve(&session).await.unwrap(), guest);
    }

    #[tokio::test]
    async fn test_peek_never_mints() {
        let session = FakeSession::default();
        let resolver = IdentityResolver::new(true);
        assert_eq!(resolver.peek(&session).await.unwrap(), None);
        assert!(session.token.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_require_customer() {
        let resolver = IdentityResolver::new(true);
        assert!(matches!(
            resolver.require_customer(&FakeSession::default()).await,
            Err(ShopError::Unauthenticated)
        ));
        let user = resolver
            .require_customer(&FakeSession::logged_in(2))
            .await
            .unwrap();
        assert_eq!(user.id, UserId::new(2));
    }
}
