//! Record-store facade over `SeaORM`.
//!
//! The rest of the service talks to [`Store`]; repositories and entities
//! stay behind it. Store-level failures keep their own error type so
//! connectivity problems are never folded into authentication failures.

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, SqlErr, Statement};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::user::{AccountChanges, AccountRecord, NewAccount};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique-constraint violation (duplicate email or username).
    #[error("duplicate value for a unique field")]
    Conflict,

    /// The target record does not exist.
    #[error("record not found")]
    NotFound,

    /// Connectivity or query failure; an infrastructure error, never a
    /// client error.
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}

impl StoreError {
    /// Classify a write failure, catching constraint races the pre-checks
    /// cannot.
    pub(crate) fn from_db(err: sea_orm::DbErr) -> Self {
        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            Self::Conflict
        } else {
            Self::Db(err)
        }
    }
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> anyhow::Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> anyhow::Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with("sqlite::memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    pub async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<crate::entities::users::Model>, StoreError> {
        self.user_repo().find_by_email(email).await
    }

    pub async fn find_account_by_id(&self, id: i32) -> Result<Option<AccountRecord>, StoreError> {
        self.user_repo().find_by_id(id).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<AccountRecord>, StoreError> {
        self.user_repo().list().await
    }

    pub async fn create_account(&self, new: NewAccount) -> Result<AccountRecord, StoreError> {
        self.user_repo().create(new).await
    }

    pub async fn update_account(
        &self,
        id: i32,
        changes: AccountChanges,
    ) -> Result<AccountRecord, StoreError> {
        self.user_repo().update(id, changes).await
    }

    pub async fn delete_account(&self, id: i32) -> Result<(), StoreError> {
        self.user_repo().delete(id).await
    }
}
