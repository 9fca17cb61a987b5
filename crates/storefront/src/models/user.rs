//! Customer accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use litus_core::{UserId, Username};

/// A customer account (domain type). The password hash never leaves `db`.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// Whether the account may use the admin API.
    pub is_admin: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}
