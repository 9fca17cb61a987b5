//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an account with the admin flag set
//! litus-cli admin create -u admin -p 'a-long-password'
//!
//! # Flip the flag on an existing customer
//! litus-cli admin promote -u deniz
//! ```

use litus_storefront::db::StoragePolicy;
use litus_storefront::services::AuthService;

use super::{CommandError, connect};

/// Create a new admin account.
///
/// # Returns
///
/// The ID of the created account.
pub async fn create(username: &str, password: &str) -> Result<i32, CommandError> {
    let pool = connect().await?;

    tracing::info!("Creating admin account: {}", username);
    let user = AuthService::new(&pool, StoragePolicy::default())
        .create_account(username, password, true)
        .await?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Username: {}",
        user.id,
        user.username
    );
    Ok(user.id.as_i32())
}

/// Grant (`is_admin = true`) or revoke the admin flag.
pub async fn promote(username: &str, is_admin: bool) -> Result<(), CommandError> {
    let pool = connect().await?;

    AuthService::new(&pool, StoragePolicy::default())
        .set_admin(username, is_admin)
        .await?;

    if is_admin {
        tracing::info!("{} is now an admin", username);
    } else {
        tracing::info!("{} is no longer an admin", username);
    }
    Ok(())
}
