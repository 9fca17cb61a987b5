//! Authentication route handlers.
//!
//! Logging in switches the request identity to the customer. The guest token
//! stays in the session, so the guest cart is visible again after logout; the
//! two are never merged.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use litus_core::Identity;

use super::Ack;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{KnownIdentity, OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::state::AppState;

/// Login and registration body.
#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct LoggedIn {
    pub user: CurrentUser,
}

#[derive(Debug, Serialize)]
pub struct Nothing {}

/// Current identity description.
#[derive(Debug, Serialize)]
pub struct Me {
    pub authenticated: bool,
    pub user: Option<CurrentUser>,
    pub identity: Option<Identity>,
    pub guests_allowed: bool,
}

async fn start_session(session: &Session, user: &User) -> Result<CurrentUser> {
    let current = CurrentUser::from(user);
    set_current_user(session, &current).await?;
    set_sentry_user(&current.id, Some(current.username.as_str()));
    Ok(current)
}

/// POST /api/auth/register
#[instrument(skip(state, session, body), fields(username = %body.username))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<Credentials>,
) -> Result<Json<Ack<LoggedIn>>> {
    let user = state.auth().register(&body.username, &body.password).await?;
    let user = start_session(&session, &user).await?;
    Ok(Json(Ack::ok("Account created", LoggedIn { user })))
}

/// POST /api/auth/login
#[instrument(skip(state, session, body), fields(username = %body.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<Credentials>,
) -> Result<Json<Ack<LoggedIn>>> {
    let user = state.auth().login(&body.username, &body.password).await?;
    let user = start_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, "Customer logged in");
    Ok(Json(Ack::ok("Logged in", LoggedIn { user })))
}

/// POST /api/auth/logout
pub async fn logout(session: Session) -> Result<Json<Ack<Nothing>>> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Json(Ack::ok("Logged out", Nothing {})))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    KnownIdentity(identity): KnownIdentity,
) -> Json<Me> {
    Json(Me {
        authenticated: user.is_some(),
        user,
        identity,
        guests_allowed: state.resolver().allows_guests(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::routes::tests::{send, test_app};

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials {
            username: "deniz".to_string(),
            password: "deniz-yildizi".to_string(),
        };
        let debug_output = format!("{creds:?}");
        assert!(debug_output.contains("deniz"));
        assert!(!debug_output.contains("yildizi"));
    }

    #[tokio::test]
    async fn test_me_anonymous() {
        let (status, json) = send(test_app(true), "GET", "/api/auth/me", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["authenticated"], false);
        assert!(json["identity"].is_null());
        assert_eq!(json["guests_allowed"], true);
    }

    #[tokio::test]
    async fn test_register_rejects_short_password_before_storage() {
        let body = json!({ "username": "deniz", "password": "short" });
        let (status, json) = send(test_app(true), "POST", "/api/auth/register", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_logout_without_login_succeeds() {
        let (status, json) = send(test_app(true), "POST", "/api/auth/logout", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
    }
}
