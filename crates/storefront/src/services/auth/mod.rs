//! Authentication service.
//!
//! Username and password accounts with Argon2id hashes.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use litus_core::Username;

use crate::db::users::UserRepository;
use crate::db::{RepositoryError, Replay, StoragePolicy};
use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    pool: &'a PgPool,
    policy: StoragePolicy,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, policy: StoragePolicy) -> Self {
        Self { pool, policy }
    }

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` if the username format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        self.create_account(username, password, false).await
    }

    /// Create an account with an explicit admin flag (used by the CLI).
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::register`].
    pub async fn create_account(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User, AuthError> {
        let username = Username::parse(username)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let pool = self.pool;
        let (username_ref, hash_ref) = (&username, password_hash.as_str());
        let user = self
            .policy
            .run("users.create", Replay::AtMostOnce, move || async move {
                UserRepository::new(pool)
                    .create(username_ref, hash_ref, is_admin)
                    .await
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, username = %user.username, is_admin, "Account created");
        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let pool = self.pool;
        let username_ref = &username;
        let (user, password_hash) = self
            .policy
            .run("users.get_password_hash", Replay::Idempotent, move || async move {
                UserRepository::new(pool).get_password_hash(username_ref).await
            })
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;
        Ok(user)
    }

    /// Grant or revoke the admin flag on an existing account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if no such account exists.
    pub async fn set_admin(&self, username: &str, is_admin: bool) -> Result<(), AuthError> {
        let username = Username::parse(username)?;

        let pool = self.pool;
        let username_ref = &username;
        self.policy
            .run("users.set_admin", Replay::Idempotent, move || async move {
                UserRepository::new(pool).set_admin(username_ref, is_admin).await
            })
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::InvalidCredentials,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(username = %username, is_admin, "Admin flag updated");
        Ok(())
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
