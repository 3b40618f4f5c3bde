//! Connection pool construction and schema migration

use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::{config::DatabaseConfig, error::AppResult};

/// Open the connection pool described by `config`.
///
/// Each request handler acquires its own connection from the pool for the
/// duration of one unit of work. WAL lets readers proceed while a writer holds
/// the lock, and the busy timeout makes concurrent writers queue instead of
/// failing immediately. Foreign keys are left unenforced: loans keep their
/// `book_id` after the book itself has been deleted.
pub async fn connect(config: &DatabaseConfig) -> AppResult<Pool<Sqlite>> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(config.busy_timeout_secs))
        .foreign_keys(false);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(options)
        .await?;

    tracing::info!("Connected to database {}", config.url);
    Ok(pool)
}

/// Apply the embedded migrations under `migrations/`
pub async fn migrate(pool: &Pool<Sqlite>) -> AppResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

/// Throwaway file-backed databases for tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A migrated pool over a fresh SQLite file in the temp directory.
    pub async fn pool() -> Pool<Sqlite> {
        let path = std::env::temp_dir().join(format!("library-desk-{}.db", uuid::Uuid::new_v4()));
        let config = DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections: 4,
            min_connections: 1,
            acquire_timeout_secs: 10,
            busy_timeout_secs: 10,
        };
        let pool = connect(&config).await.expect("Failed to open test database");
        migrate(&pool).await.expect("Failed to migrate test database");
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_create_both_tables() {
        let pool = testing::pool().await;

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('books', 'loans') ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(tables, vec!["books".to_string(), "loans".to_string()]);
    }

    #[tokio::test]
    async fn test_migrate_twice_is_harmless() {
        let pool = testing::pool().await;
        migrate(&pool).await.unwrap();
    }
}
