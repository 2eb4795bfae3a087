use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use thiserror::Error;
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::users;

/// Store-level errors. Uniqueness violations are the only recoverable
/// failure; everything else aborts the calling operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Username or email already exists")]
    Conflict,

    #[error("User {0} not found")]
    NotFound(i32),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn map_db_err(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Conflict,
        _ => StoreError::Other(err.into()),
    }
}

/// User data returned from the repository (without the password digest)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            is_admin: model.is_admin,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Field set applied by the admin edit operation. A `None` password keeps
/// the stored digest unchanged.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub password: Option<String>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by username (exact, case-sensitive)
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Look up a user whose username OR email matches the identifier and
    /// whose password verifies against the stored digest. Returns `None`
    /// for both unknown identifiers and wrong passwords so the caller
    /// cannot tell which part failed.
    ///
    /// Note: Argon2 verification runs in `spawn_blocking` because it is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn find_by_credential(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(identifier))
                    .add(users::Column::Email.eq(identifier)),
            )
            .one(&self.conn)
            .await
            .context("Failed to query user by credential")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let digest = user.password_digest.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || verify_password(&password, &digest))
            .await
            .context("Password verification task panicked")??;

        if is_valid {
            Ok(Some(User::from(user)))
        } else {
            Ok(None)
        }
    }

    /// Insert a new non-admin user. A duplicate username or email yields
    /// `StoreError::Conflict` and leaves the table unchanged.
    pub async fn insert(
        &self,
        username: &str,
        email: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<User, StoreError> {
        let password = password.to_string();
        let config = config.clone();
        let digest = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_digest: Set(digest),
            is_admin: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await.map_err(map_db_err)?;

        Ok(User::from(model))
    }

    /// All users ordered by id ascending (insertion order). No pagination.
    pub async fn list_all(&self) -> Result<Vec<User>> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(models.into_iter().map(User::from).collect())
    }

    /// Overwrite username/email/is_admin of the row with the given id,
    /// replacing the password digest only when a new password is supplied.
    /// A missing id is reported as `StoreError::NotFound` rather than a
    /// silent no-op; a uniqueness violation leaves the row unchanged.
    pub async fn update(
        &self,
        id: i32,
        edit: UserUpdate,
        config: &SecurityConfig,
    ) -> Result<User, StoreError> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
            .ok_or(StoreError::NotFound(id))?;

        let mut active: users::ActiveModel = user.into();
        active.username = Set(edit.username);
        active.email = Set(edit.email);
        active.is_admin = Set(edit.is_admin);

        if let Some(password) = edit.password {
            let config = config.clone();
            let digest = task::spawn_blocking(move || hash_password(&password, Some(&config)))
                .await
                .context("Password hashing task panicked")??;
            active.password_digest = Set(digest);
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await.map_err(map_db_err)?;

        Ok(User::from(model))
    }

    /// Delete the row with the given id. Returns false when no such row
    /// exists; deleting a missing id is not an error.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = users::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected > 0)
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC-format digest.
pub fn verify_password(password: &str, digest: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(digest).map_err(|e| anyhow::anyhow!("Invalid password digest: {e}"))?;

    let argon2 = Argon2::default();
    Ok(argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
