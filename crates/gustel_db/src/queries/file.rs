//! Sound catalog queries.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use gustel_core::SoundFile;
use sqlx::SqlitePool;
use tracing::debug;

use super::tag::ensure_tag;
use crate::error::{DbError, DbResult, sql_id};
use crate::models::FileRecord;

/// Filters for [`find_files`]. Unset fields match everything, set fields are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileQuery {
    pub id: Option<i64>,

    /// Case-insensitive exact match
    pub display_name: Option<String>,

    pub file_name: Option<String>,
    pub content_hash: Option<String>,
    pub owner_guild_id: Option<u64>,
    pub uploader_id: Option<u64>,
    pub deleted: Option<bool>,

    /// Only files public or owned by this guild
    pub visible_to: Option<u64>,
}

impl FileQuery {
    /// Files that can be played in `guild_id`: visible there and not deleted.
    pub fn playable_in(guild_id: u64) -> Self {
        Self {
            deleted: Some(false),
            visible_to: Some(guild_id),
            ..Self::default()
        }
    }
}

/// A sound about to be inserted.
#[derive(Debug, Clone)]
pub struct NewSoundFile {
    pub display_name: String,
    pub file_name: String,
    pub content_hash: String,
    pub duration_seconds: u64,
    pub size_bytes: u64,
    pub owner_guild_id: Option<u64>,
    pub uploader_id: Option<u64>,
    pub public: bool,
    pub tags: Vec<String>,
}

/// Insert a sound with its tags in one transaction, returning its id.
///
/// A file with the same content hash or storage name yields `AlreadyExists`.
pub async fn create_file(pool: &SqlitePool, file: &NewSoundFile) -> DbResult<i64> {
    if file.display_name.trim().is_empty() {
        return Err(DbError::invalid_data("display name must not be empty"));
    }
    let duration = i64::try_from(file.duration_seconds)
        .map_err(|_| DbError::invalid_data("duration out of range"))?;
    let size =
        i64::try_from(file.size_bytes).map_err(|_| DbError::invalid_data("size out of range"))?;

    let mut tx = pool.begin().await?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO files (
            display_name, file_name, content_hash, duration_seconds, size_bytes,
            owner_guild_id, uploader_id, public, deleted, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
        RETURNING id
        "#,
    )
    .bind(&file.display_name)
    .bind(&file.file_name)
    .bind(&file.content_hash)
    .bind(duration)
    .bind(size)
    .bind(file.owner_guild_id.map(sql_id))
    .bind(file.uploader_id.map(sql_id))
    .bind(file.public)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| DbError::from_unique(e, "file", &file.content_hash))?;

    for tag in &file.tags {
        let tag_id = ensure_tag(&mut tx, tag).await?;
        sqlx::query("INSERT OR IGNORE INTO file_tags (file_id, tag_id) VALUES (?, ?)")
            .bind(id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    debug!(id, name = %file.display_name, "stored sound file");
    Ok(id)
}

/// Files matching every set field of `query`, with their tags, ordered by name.
pub async fn find_files(pool: &SqlitePool, query: &FileQuery) -> DbResult<Vec<SoundFile>> {
    let records = sqlx::query_as::<_, FileRecord>(
        r#"
        SELECT * FROM files
        WHERE (?1 IS NULL OR id = ?1)
          AND (?2 IS NULL OR display_name = ?2 COLLATE NOCASE)
          AND (?3 IS NULL OR file_name = ?3)
          AND (?4 IS NULL OR content_hash = ?4)
          AND (?5 IS NULL OR owner_guild_id = ?5)
          AND (?6 IS NULL OR uploader_id = ?6)
          AND (?7 IS NULL OR deleted = ?7)
          AND (?8 IS NULL OR public = 1 OR owner_guild_id = ?8)
        ORDER BY display_name COLLATE NOCASE, id
        "#,
    )
    .bind(query.id)
    .bind(query.display_name.as_deref())
    .bind(query.file_name.as_deref())
    .bind(query.content_hash.as_deref())
    .bind(query.owner_guild_id.map(sql_id))
    .bind(query.uploader_id.map(sql_id))
    .bind(query.deleted)
    .bind(query.visible_to.map(sql_id))
    .fetch_all(pool)
    .await?;

    let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    let mut tags = load_tags(pool, &ids).await?;

    Ok(records
        .into_iter()
        .map(|record| {
            let file_tags = tags.remove(&record.id).unwrap_or_default();
            record.into_sound_file(file_tags)
        })
        .collect())
}

/// Get a single file by id, deleted or not.
pub async fn get_file(pool: &SqlitePool, id: i64) -> DbResult<Option<SoundFile>> {
    let query = FileQuery {
        id: Some(id),
        ..FileQuery::default()
    };
    Ok(find_files(pool, &query).await?.into_iter().next())
}

/// Every file in the catalog, deleted ones included.
pub async fn list_files(pool: &SqlitePool) -> DbResult<Vec<SoundFile>> {
    find_files(pool, &FileQuery::default()).await
}

/// Whether `file_id` may be seen from `guild_id`.
pub async fn is_visible(pool: &SqlitePool, file_id: i64, guild_id: u64) -> DbResult<bool> {
    let row: Option<(bool, Option<i64>)> =
        sqlx::query_as("SELECT public, owner_guild_id FROM files WHERE id = ?")
            .bind(file_id)
            .fetch_optional(pool)
            .await?;

    match row {
        Some((public, owner)) => Ok(public || owner == Some(sql_id(guild_id))),
        None => Err(DbError::not_found("file", file_id)),
    }
}

/// Mark a file as deleted (its asset vanished) or restore it.
pub async fn set_file_deleted(pool: &SqlitePool, id: i64, deleted: bool) -> DbResult<()> {
    let result = sqlx::query("UPDATE files SET deleted = ? WHERE id = ?")
        .bind(deleted)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("file", id));
    }
    Ok(())
}

async fn load_tags(pool: &SqlitePool, file_ids: &[i64]) -> DbResult<HashMap<i64, BTreeSet<String>>> {
    if file_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i64, String)> = sqlx::query_as(
        r#"
        SELECT ft.file_id, t.name
        FROM file_tags ft
        JOIN tags t ON t.id = ft.tag_id
        WHERE ft.file_id IN (SELECT value FROM json_each(?))
        "#,
    )
    .bind(serde_json::to_string(file_ids)?)
    .fetch_all(pool)
    .await?;

    let mut tags: HashMap<i64, BTreeSet<String>> = HashMap::new();
    for (file_id, name) in rows {
        tags.entry(file_id).or_default().insert(name);
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::GustelDb;

    fn upload(name: &str, hash: &str, owner: u64, public: bool, tags: &[&str]) -> NewSoundFile {
        NewSoundFile {
            display_name: name.to_string(),
            file_name: format!("{hash}_{name}.mp3"),
            content_hash: hash.to_string(),
            duration_seconds: 4,
            size_bytes: 2048,
            owner_guild_id: Some(owner),
            uploader_id: Some(99),
            public,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn names(files: &[SoundFile]) -> Vec<&str> {
        files.iter().map(|f| f.display_name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_create_file_with_tags() {
        let db = GustelDb::open_in_memory().await.unwrap();
        let pool = db.pool();

        let id = create_file(pool, &upload("Airhorn", "h1", 1, true, &["Meme", "short", "meme"]))
            .await
            .unwrap();

        let file = get_file(pool, id).await.unwrap().unwrap();
        assert_eq!(file.display_name, "Airhorn");
        assert_eq!(file.duration_seconds, 4);
        assert_eq!(file.owner_guild_id, Some(1));
        assert_eq!(file.uploader_id, Some(99));
        assert!(!file.deleted);
        assert_eq!(
            file.tags.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["meme", "short"]
        );
    }

    #[tokio::test]
    async fn test_duplicate_hash_is_rejected() {
        let db = GustelDb::open_in_memory().await.unwrap();
        let pool = db.pool();

        create_file(pool, &upload("One", "same", 1, true, &[])).await.unwrap();
        let err = create_file(pool, &upload("Two", "same", 2, true, &["x"]))
            .await
            .unwrap_err();
        assert!(err.is_already_exists());

        // the failed insert must not leave tags behind
        assert_eq!(list_files(pool).await.unwrap().len(), 1);
        assert_eq!(db.stats().await.unwrap().tag_count, 0);
    }

    #[tokio::test]
    async fn test_find_files_filters() {
        let db = GustelDb::open_in_memory().await.unwrap();
        let pool = db.pool();

        create_file(pool, &upload("Airhorn", "h1", 1, true, &[])).await.unwrap();
        create_file(pool, &upload("Geheim", "h2", 1, false, &[])).await.unwrap();
        let gone = create_file(pool, &upload("Weg", "h3", 2, true, &[])).await.unwrap();
        set_file_deleted(pool, gone, true).await.unwrap();

        let home = find_files(pool, &FileQuery::playable_in(1)).await.unwrap();
        assert_eq!(names(&home), vec!["Airhorn", "Geheim"]);

        let other = find_files(pool, &FileQuery::playable_in(2)).await.unwrap();
        assert_eq!(names(&other), vec!["Airhorn"]);

        let by_name = FileQuery {
            display_name: Some("AIRHORN".to_string()),
            ..FileQuery::default()
        };
        assert_eq!(names(&find_files(pool, &by_name).await.unwrap()), vec!["Airhorn"]);

        let by_hash = FileQuery {
            content_hash: Some("h3".to_string()),
            ..FileQuery::default()
        };
        let found = find_files(pool, &by_hash).await.unwrap();
        assert_eq!(names(&found), vec!["Weg"]);
        assert!(found[0].deleted);

        assert_eq!(list_files(pool).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_visibility_and_restore() {
        let db = GustelDb::open_in_memory().await.unwrap();
        let pool = db.pool();

        let private = create_file(pool, &upload("Geheim", "h1", 1, false, &[])).await.unwrap();
        assert!(is_visible(pool, private, 1).await.unwrap());
        assert!(!is_visible(pool, private, 2).await.unwrap());
        assert!(is_visible(pool, 500, 1).await.unwrap_err().is_not_found());

        set_file_deleted(pool, private, true).await.unwrap();
        set_file_deleted(pool, private, false).await.unwrap();
        assert!(!get_file(pool, private).await.unwrap().unwrap().deleted);

        assert!(set_file_deleted(pool, 500, true).await.unwrap_err().is_not_found());
    }
}
