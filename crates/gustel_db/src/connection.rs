//! Opening the bot's SQLite file.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::DbResult;

/// Concurrent connections on a file database. Command handlers, the hourly
/// guild sync and the library sync may query at the same time; SQLite
/// serialises their writes anyway.
const POOL_SIZE: u32 = 5;

/// How long a writer waits for the lock held by another connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Tables counted by [`GustelDb::stats`], in report order.
const COUNTED_TABLES: [&str; 5] = ["servers", "users", "files", "tags", "brotato_runs"];

/// Handle to the catalog, server settings and Brotato runs.
///
/// Every guild shares one SQLite file; rows carry their server id.
#[derive(Debug, Clone)]
pub struct GustelDb {
    pool: SqlitePool,
}

impl GustelDb {
    /// Open the database file, creating it and its folder on first start.
    ///
    /// The default location sits inside the data directory, which may not
    /// exist yet when the bot runs for the first time.
    pub async fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        match path.parent() {
            Some(folder) if !folder.as_os_str().is_empty() => std::fs::create_dir_all(folder)?,
            _ => {}
        }

        info!("Opening database {}", path.display());
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .pragma("synchronous", "NORMAL")
            .busy_timeout(BUSY_TIMEOUT)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(POOL_SIZE)
            .connect_with(options)
            .await?;
        Self::migrated(pool).await
    }

    /// Private database for tests. A single connection, since every new
    /// connection to `:memory:` would see an empty database.
    pub async fn open_in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> DbResult<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!("Schema up to date");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for open queries and release the file.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Round trip through the pool, used by `gustelbot db check`.
    pub async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Row counts for `gustelbot db check`.
    pub async fn stats(&self) -> DbResult<DbStats> {
        let mut counts = [0u64; COUNTED_TABLES.len()];
        for (count, table) in counts.iter_mut().zip(COUNTED_TABLES) {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            let rows: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
            *count = rows.max(0) as u64;
        }

        let [server_count, user_count, file_count, tag_count, brotato_run_count] = counts;
        Ok(DbStats {
            server_count,
            user_count,
            file_count,
            tag_count,
            brotato_run_count,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbStats {
    pub server_count: u64,
    pub user_count: u64,
    pub file_count: u64,
    pub tag_count: u64,
    pub brotato_run_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = GustelDb::open_in_memory().await.unwrap();
        db.health_check().await.unwrap();

        let stats = db.stats().await.unwrap();
        assert_eq!(stats.server_count, 0);
        assert_eq!(stats.file_count, 0);
        assert_eq!(stats.brotato_run_count, 0);
    }

    #[tokio::test]
    async fn test_open_creates_parent_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nested").join("gustelbot.db");

        let db = GustelDb::open(&path).await.unwrap();
        db.health_check().await.unwrap();
        db.close().await;

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_stats_count_rows() {
        let db = GustelDb::open_in_memory().await.unwrap();
        crate::queries::upsert_server(db.pool(), 1, "Gustelhausen").await.unwrap();
        crate::queries::upsert_user(db.pool(), 7, "gustel").await.unwrap();

        assert_eq!(
            db.stats().await.unwrap(),
            DbStats {
                server_count: 1,
                user_count: 1,
                ..DbStats::default()
            }
        );
    }
}
