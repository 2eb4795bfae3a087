//! `SeaORM` implementation of the `AdminService` trait.

use async_trait::async_trait;

use crate::config::SecurityConfig;
use crate::db::{Store, User, UserUpdate};
use crate::services::admin_service::{AdminError, AdminService, UserEdit};

pub struct SeaOrmAdminService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAdminService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

#[async_trait]
impl AdminService for SeaOrmAdminService {
    async fn list_users(&self) -> Result<Vec<User>, AdminError> {
        Ok(self.store.list_users().await?)
    }

    async fn update_user(&self, id: i32, edit: UserEdit) -> Result<User, AdminError> {
        if edit.username.is_empty() || edit.email.is_empty() {
            return Err(AdminError::Validation(
                "Username and email cannot be empty".to_string(),
            ));
        }

        if let Some(password) = &edit.password
            && password.len() < self.security.min_password_length
        {
            return Err(AdminError::Validation(format!(
                "Password must be at least {} characters long",
                self.security.min_password_length
            )));
        }

        let update = UserUpdate {
            username: edit.username,
            email: edit.email,
            is_admin: edit.is_admin,
            password: edit.password,
        };

        let user = self.store.update_user(id, update, &self.security).await?;

        tracing::info!("User {} updated via admin panel", user.id);

        Ok(user)
    }

    async fn delete_user(&self, id: i32) -> Result<bool, AdminError> {
        let deleted = self.store.delete_user(id).await?;

        if deleted {
            tracing::info!("User {id} deleted via admin panel");
        }

        Ok(deleted)
    }
}
