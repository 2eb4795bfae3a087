use crate::entities::prelude::*;
use crate::entities::users;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Seed credentials for the bootstrap administrator account.
/// The password should be changed after first login.
const SEED_USERNAME: &str = "admin";
const SEED_EMAIL: &str = "admin@example.com";
const SEED_PASSWORD: &str = "admin123";

/// Hash the seed password using Argon2id
fn hash_seed_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(SEED_PASSWORD.as_bytes(), &salt)
        .expect("Failed to hash seed password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Seed the admin row. A duplicate row means a previous initialization
        // already ran; the conflict is an idempotent no-op.
        let now = chrono::Utc::now().to_rfc3339();
        let password_digest = hash_seed_password();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                users::Column::Username,
                users::Column::Email,
                users::Column::PasswordDigest,
                users::Column::IsAdmin,
                users::Column::CreatedAt,
                users::Column::UpdatedAt,
            ])
            .values_panic([
                SEED_USERNAME.into(),
                SEED_EMAIL.into(),
                password_digest.into(),
                true.into(),
                now.clone().into(),
                now.into(),
            ])
            .on_conflict(
                OnConflict::column(users::Column::Username)
                    .do_nothing()
                    .to_owned(),
            )
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
