//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;

use crate::config::SecurityConfig;
use crate::db::{Store, User};
use crate::services::auth_service::{AuthError, AuthService, AuthenticatedUser};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

fn to_authenticated(user: User) -> AuthenticatedUser {
    AuthenticatedUser {
        id: user.id,
        username: user.username,
        email: user.email,
        is_admin: user.is_admin,
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        if identifier.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Please fill out both fields".to_string(),
            ));
        }

        let user = self
            .store
            .find_by_credential(identifier, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(to_authenticated(user))
    }

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("All fields are required".to_string()));
        }

        if password != confirm_password {
            return Err(AuthError::Validation("Passwords do not match".to_string()));
        }

        if password.len() < self.security.min_password_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters long",
                self.security.min_password_length
            )));
        }

        let user = self
            .store
            .insert_user(username, email, password, &self.security)
            .await?;

        Ok(to_authenticated(user))
    }

    async fn get_user(&self, username: &str) -> Result<AuthenticatedUser, AuthError> {
        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(to_authenticated(user))
    }
}
