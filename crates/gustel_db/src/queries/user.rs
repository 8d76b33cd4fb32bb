//! User queries.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{DbResult, sql_id};
use crate::models::User;

/// Insert a user or refresh their account name.
pub async fn upsert_user(pool: &SqlitePool, id: u64, name: &str) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(sql_id(id))
    .bind(name)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

/// Record the name a user goes by in a server. The user must exist.
pub async fn upsert_display_name(
    pool: &SqlitePool,
    user_id: u64,
    server_id: u64,
    display_name: &str,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO user_display_names (user_id, server_id, display_name)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(user_id, server_id) DO UPDATE SET
            display_name = excluded.display_name
        "#,
    )
    .bind(sql_id(user_id))
    .bind(sql_id(server_id))
    .bind(display_name)
    .execute(pool)
    .await?;
    Ok(())
}

/// Get a user, named as they appear in `server_id` when given.
pub async fn get_user(pool: &SqlitePool, id: u64, server_id: Option<u64>) -> DbResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, COALESCE(d.display_name, u.name) AS name, u.updated_at
        FROM users u
        LEFT JOIN user_display_names d
            ON d.user_id = u.id AND d.server_id = ?2
        WHERE u.id = ?1
        "#,
    )
    .bind(sql_id(id))
    .bind(server_id.map(sql_id))
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GustelDb;

    #[tokio::test]
    async fn test_display_name_falls_back_to_account_name() {
        let db = GustelDb::open_in_memory().await.unwrap();
        let pool = db.pool();

        upsert_user(pool, 5, "gustel").await.unwrap();
        upsert_display_name(pool, 5, 100, "Gustav").await.unwrap();

        let here = get_user(pool, 5, Some(100)).await.unwrap().unwrap();
        assert_eq!(here.name, "Gustav");

        let elsewhere = get_user(pool, 5, Some(200)).await.unwrap().unwrap();
        assert_eq!(elsewhere.name, "gustel");

        let global = get_user(pool, 5, None).await.unwrap().unwrap();
        assert_eq!(global.name, "gustel");

        assert!(get_user(pool, 6, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_display_name_requires_user() {
        let db = GustelDb::open_in_memory().await.unwrap();
        assert!(upsert_display_name(db.pool(), 9, 100, "Nobody").await.is_err());
    }
}
