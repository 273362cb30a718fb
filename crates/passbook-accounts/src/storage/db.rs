//! Database handle, unit of work, and error type.

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, Transaction};
use tracing::info;

/// SQLite-backed store for users and the refresh-token ledger.
#[derive(Clone)]
pub struct AccountsDatabase {
    pool: Pool<Sqlite>,
}

impl AccountsDatabase {
    /// Open (or create) the database at `path`, enabling WAL journal mode
    /// and foreign keys, then run pending migrations.
    pub async fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io(e.to_string()))?;
        }

        let options =
            SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))
                .map_err(|e| DatabaseError::Connection(e.to_string()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .foreign_keys(true)
                .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        info!(path = %path.display(), "Accounts database opened");

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Open an in-memory database (development and tests).
    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DatabaseError::Connection(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        info!("Accounts database migrations complete");
        Ok(())
    }

    /// Begin a unit of work. Dropping it without [`UnitOfWork::commit`]
    /// rolls the transaction back, so an early `?` return undoes every
    /// write of the operation.
    pub async fn begin(&self) -> Result<UnitOfWork, DatabaseError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        Ok(UnitOfWork { tx })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

/// One transactional session over the accounts store.
pub struct UnitOfWork {
    pub(super) tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    pub async fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit().await.map_err(Into::into)
    }

    pub async fn rollback(self) -> Result<(), DatabaseError> {
        self.tx.rollback().await.map_err(Into::into)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.to_string())
            }
            _ => Self::Query(e.to_string()),
        }
    }
}
