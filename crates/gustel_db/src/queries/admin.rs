//! Admin role queries.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{DbError, DbResult, discord_id, sql_id};

/// Role ids allowed to configure `server_id`.
pub async fn list_admin_groups(pool: &SqlitePool, server_id: u64) -> DbResult<Vec<u64>> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT role_id FROM server_admin_groups WHERE server_id = ? ORDER BY role_id",
    )
    .bind(sql_id(server_id))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| discord_id(id)).collect())
}

pub async fn add_admin_group(pool: &SqlitePool, server_id: u64, role_id: u64) -> DbResult<()> {
    sqlx::query("INSERT INTO server_admin_groups (server_id, role_id, created_at) VALUES (?, ?, ?)")
        .bind(sql_id(server_id))
        .bind(sql_id(role_id))
        .bind(Utc::now())
        .execute(pool)
        .await
        .map_err(|e| DbError::from_unique(e, "admin group", role_id))?;
    Ok(())
}

pub async fn remove_admin_group(pool: &SqlitePool, server_id: u64, role_id: u64) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM server_admin_groups WHERE server_id = ? AND role_id = ?")
        .bind(sql_id(server_id))
        .bind(sql_id(role_id))
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("admin group", role_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GustelDb;

    #[tokio::test]
    async fn test_admin_group_lifecycle() {
        let db = GustelDb::open_in_memory().await.unwrap();
        let pool = db.pool();

        add_admin_group(pool, 1, 500).await.unwrap();
        add_admin_group(pool, 1, 501).await.unwrap();
        add_admin_group(pool, 2, 500).await.unwrap();

        let err = add_admin_group(pool, 1, 500).await.unwrap_err();
        assert!(err.is_already_exists());

        assert_eq!(list_admin_groups(pool, 1).await.unwrap(), vec![500, 501]);

        remove_admin_group(pool, 1, 500).await.unwrap();
        assert_eq!(list_admin_groups(pool, 1).await.unwrap(), vec![501]);
        assert_eq!(list_admin_groups(pool, 2).await.unwrap(), vec![500]);

        let err = remove_admin_group(pool, 1, 500).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
