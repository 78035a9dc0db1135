//! Split reader/writer pools over one SQLite file in WAL mode.
//!
//! Every write goes through a single writer connection, which also applies
//! migrations before any reader connects. Readers are opened `read_only`.
//! Foreign keys are on for both; account deletion cascades
//! (user -> conversations -> messages) through them.

use std::str::FromStr;
use std::time::Duration;

use parley_types::config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open the writer, migrate, then open the reader pool.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let options = connect_options(config)?;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await?;
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(config.max_readers.max(1))
            .connect_with(options.read_only(true))
            .await?;

        tracing::debug!(
            url = %redact(&config.url),
            readers = config.max_readers,
            "Database pool ready"
        );
        Ok(Self { reader, writer })
    }
}

fn connect_options(config: &DatabaseConfig) -> Result<SqliteConnectOptions, sqlx::Error> {
    Ok(SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(config.busy_timeout_secs)))
}

/// URL without its query string.
fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::test_pool;

    #[tokio::test]
    async fn test_migrations_create_schema() {
        let pool = test_pool().await;

        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations'
             ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        assert_eq!(names, ["conversations", "messages", "users"]);
    }

    #[tokio::test]
    async fn test_writer_pragmas() {
        let pool = test_pool().await;

        let journal: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool.writer)
            .await
            .unwrap();

        assert_eq!(journal.to_lowercase(), "wal");
        assert_eq!(foreign_keys, 1);
    }

    #[tokio::test]
    async fn test_reader_rejects_writes() {
        let pool = test_pool().await;

        let result = sqlx::query("DELETE FROM users").execute(&pool.reader).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_redact_drops_query() {
        assert_eq!(super::redact("sqlite://a.db?mode=rwc"), "sqlite://a.db");
        assert_eq!(super::redact("sqlite::memory:"), "sqlite::memory:");
    }
}
