//! Domain service for registration and authentication.

use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Deliberately generic: never reveals which of username/email/password
    /// was wrong.
    #[error("Invalid username/email or password")]
    InvalidCredentials,

    #[error("Username or email already exists")]
    Conflict,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::Conflict,
            StoreError::NotFound(_) => Self::UserNotFound,
            StoreError::Other(e) => Self::Database(e.to_string()),
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// User info DTO for responses and session construction.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies an identifier (username or email) and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if no matching user exists
    /// or the password does not verify.
    async fn login(&self, identifier: &str, password: &str)
    -> Result<AuthenticatedUser, AuthError>;

    /// Creates a new non-admin account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for empty fields, mismatched
    /// confirmation, or a too-short password; [`AuthError::Conflict`] when
    /// the username or email is already taken.
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<AuthenticatedUser, AuthError>;

    /// Gets information for a specific user.
    async fn get_user(&self, username: &str) -> Result<AuthenticatedUser, AuthError>;
}
