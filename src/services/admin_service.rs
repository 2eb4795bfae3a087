//! Domain service for the admin user-management panel.

use thiserror::Error;

use crate::db::{StoreError, User};

/// Errors specific to user administration.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Username or email already exists")]
    Conflict,

    #[error("User {0} not found")]
    NotFound(i32),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for AdminError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::Conflict,
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Other(e) => Self::Database(e.to_string()),
        }
    }
}

impl From<anyhow::Error> for AdminError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Admin-panel edit request. A `None` password means "leave unchanged".
#[derive(Debug, Clone)]
pub struct UserEdit {
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub password: Option<String>,
}

/// Domain service trait for user administration.
#[async_trait::async_trait]
pub trait AdminService: Send + Sync {
    /// All user accounts in insertion order.
    async fn list_users(&self) -> Result<Vec<User>, AdminError>;

    /// Overwrites the named fields of a user.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::NotFound`] for a missing id,
    /// [`AdminError::Conflict`] on a uniqueness violation, and
    /// [`AdminError::Validation`] before any store call for bad input.
    async fn update_user(&self, id: i32, edit: UserEdit) -> Result<User, AdminError>;

    /// Deletes a user by id. Returns false when the id did not exist;
    /// repeating a delete is a no-op, not an error.
    async fn delete_user(&self, id: i32) -> Result<bool, AdminError>;
}
