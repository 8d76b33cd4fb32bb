//! Server queries.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{DbError, DbResult, sql_id};
use crate::models::Server;

/// Insert a server or refresh its name.
pub async fn upsert_server(pool: &SqlitePool, id: u64, name: &str) -> DbResult<()> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO servers (id, name, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?3)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(sql_id(id))
    .bind(name)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Get a server by guild id.
pub async fn get_server(pool: &SqlitePool, id: u64) -> DbResult<Option<Server>> {
    let server = sqlx::query_as::<_, Server>("SELECT * FROM servers WHERE id = ?")
        .bind(sql_id(id))
        .fetch_optional(pool)
        .await?;
    Ok(server)
}

/// List all known servers.
pub async fn list_servers(pool: &SqlitePool) -> DbResult<Vec<Server>> {
    let servers = sqlx::query_as::<_, Server>("SELECT * FROM servers ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(servers)
}

/// Random-play length limit of a server in seconds, 0 when unset or unknown.
pub async fn get_play_max_duration(pool: &SqlitePool, id: u64) -> DbResult<u64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT play_max_duration FROM servers WHERE id = ?")
        .bind(sql_id(id))
        .fetch_optional(pool)
        .await?;
    Ok(row.map_or(0, |(secs,)| secs.max(0) as u64))
}

/// Set the random-play length limit (0 = unlimited).
pub async fn set_play_max_duration(pool: &SqlitePool, id: u64, seconds: u64) -> DbResult<()> {
    let seconds = i64::try_from(seconds)
        .map_err(|_| DbError::invalid_data(format!("play max duration {seconds} out of range")))?;

    let result = sqlx::query("UPDATE servers SET play_max_duration = ?, updated_at = ? WHERE id = ?")
        .bind(seconds)
        .bind(Utc::now())
        .bind(sql_id(id))
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("server", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GustelDb;

    #[tokio::test]
    async fn test_upsert_refreshes_name() {
        let db = GustelDb::open_in_memory().await.unwrap();
        let pool = db.pool();

        upsert_server(pool, 42, "Alte Gilde").await.unwrap();
        upsert_server(pool, 42, "Neue Gilde").await.unwrap();

        let server = get_server(pool, 42).await.unwrap().unwrap();
        assert_eq!(server.name, "Neue Gilde");
        assert_eq!(server.guild_id(), 42);
        assert_eq!(server.play_max_duration, 0);
        assert_eq!(list_servers(pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_play_max_duration() {
        let db = GustelDb::open_in_memory().await.unwrap();
        let pool = db.pool();

        assert_eq!(get_play_max_duration(pool, 7).await.unwrap(), 0);
        assert!(set_play_max_duration(pool, 7, 30).await.unwrap_err().is_not_found());

        upsert_server(pool, 7, "Gilde").await.unwrap();
        set_play_max_duration(pool, 7, 30).await.unwrap();
        assert_eq!(get_play_max_duration(pool, 7).await.unwrap(), 30);
    }

    #[tokio::test]
    async fn test_large_snowflake_round_trips() {
        let db = GustelDb::open_in_memory().await.unwrap();
        let pool = db.pool();

        let id = 1_180_000_000_000_000_000u64;
        upsert_server(pool, id, "Gilde").await.unwrap();
        assert_eq!(get_server(pool, id).await.unwrap().unwrap().guild_id(), id);
    }
}
