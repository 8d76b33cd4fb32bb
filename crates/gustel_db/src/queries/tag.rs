//! Tag queries.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DbError, DbResult};
use crate::models::Tag;

/// Reference to a tag by row id or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagRef {
    Id(i64),
    Name(String),
}

impl From<i64> for TagRef {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for TagRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

/// Tags are matched exactly, so names are stored trimmed and lowercase.
pub fn normalize_tag_name(name: &str) -> DbResult<String> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err(DbError::invalid_data("tag name must not be empty"));
    }
    Ok(name)
}

/// Create a new tag.
pub async fn create_tag(pool: &SqlitePool, name: &str) -> DbResult<Tag> {
    let name = normalize_tag_name(name)?;
    let tag = sqlx::query_as::<_, Tag>("INSERT INTO tags (name) VALUES (?) RETURNING id, name")
        .bind(&name)
        .fetch_one(pool)
        .await
        .map_err(|e| DbError::from_unique(e, "tag", &name))?;
    Ok(tag)
}

/// Get a tag by id or name.
pub async fn get_tag(pool: &SqlitePool, tag: &TagRef) -> DbResult<Option<Tag>> {
    let found = match tag {
        TagRef::Id(id) => {
            sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await?
        }
        TagRef::Name(name) => {
            sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE name = ?")
                .bind(normalize_tag_name(name)?)
                .fetch_optional(pool)
                .await?
        }
    };
    Ok(found)
}

/// List all tags by name.
pub async fn list_tags(pool: &SqlitePool) -> DbResult<Vec<Tag>> {
    let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(tags)
}

/// Attach a tag to a file.
///
/// Tags referenced by name are created on demand; a tag id must already
/// exist. Linking twice is a no-op.
pub async fn link_tag(pool: &SqlitePool, file_id: i64, tag: &TagRef) -> DbResult<Tag> {
    let file: Option<(i64,)> = sqlx::query_as("SELECT id FROM files WHERE id = ?")
        .bind(file_id)
        .fetch_optional(pool)
        .await?;
    if file.is_none() {
        return Err(DbError::not_found("file", file_id));
    }

    let tag = match tag {
        TagRef::Id(id) => get_tag(pool, tag)
            .await?
            .ok_or_else(|| DbError::not_found("tag", id))?,
        TagRef::Name(name) => {
            let mut conn = pool.acquire().await?;
            let id = ensure_tag(&mut conn, name).await?;
            Tag {
                id,
                name: normalize_tag_name(name)?,
            }
        }
    };

    sqlx::query("INSERT OR IGNORE INTO file_tags (file_id, tag_id) VALUES (?, ?)")
        .bind(file_id)
        .bind(tag.id)
        .execute(pool)
        .await?;

    Ok(tag)
}

/// Id of the tag called `name`, creating it if needed.
pub(crate) async fn ensure_tag(conn: &mut SqliteConnection, name: &str) -> DbResult<i64> {
    let name = normalize_tag_name(name)?;

    sqlx::query("INSERT INTO tags (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
        .bind(&name)
        .execute(&mut *conn)
        .await?;

    let (id,): (i64,) = sqlx::query_as("SELECT id FROM tags WHERE name = ?")
        .bind(&name)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::GustelDb;
    use crate::queries::{NewSoundFile, create_file, get_file};

    fn upload(hash: &str) -> NewSoundFile {
        NewSoundFile {
            display_name: format!("sound {hash}"),
            file_name: format!("{hash}.mp3"),
            content_hash: hash.to_string(),
            duration_seconds: 3,
            size_bytes: 1000,
            owner_guild_id: Some(1),
            uploader_id: Some(2),
            public: true,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_tag() {
        let db = GustelDb::open_in_memory().await.unwrap();
        let pool = db.pool();

        let tag = create_tag(pool, "  Meme ").await.unwrap();
        assert_eq!(tag.name, "meme");

        assert!(create_tag(pool, "MEME").await.unwrap_err().is_already_exists());
        assert!(create_tag(pool, "   ").await.is_err());

        assert_eq!(get_tag(pool, &TagRef::Id(tag.id)).await.unwrap(), Some(tag.clone()));
        assert_eq!(get_tag(pool, &"Meme".into()).await.unwrap(), Some(tag));
        assert_eq!(get_tag(pool, &TagRef::Id(999)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_link_tag() {
        let db = GustelDb::open_in_memory().await.unwrap();
        let pool = db.pool();

        let file_id = create_file(pool, &upload("aa")).await.unwrap();

        let created = link_tag(pool, file_id, &"laut".into()).await.unwrap();
        link_tag(pool, file_id, &TagRef::Id(created.id)).await.unwrap();

        let file = get_file(pool, file_id).await.unwrap().unwrap();
        assert_eq!(file.tags.into_iter().collect::<Vec<_>>(), vec!["laut"]);

        let names: Vec<String> = list_tags(pool).await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["laut"]);
    }

    #[tokio::test]
    async fn test_link_tag_missing_targets() {
        let db = GustelDb::open_in_memory().await.unwrap();
        let pool = db.pool();

        let err = link_tag(pool, 404, &"laut".into()).await.unwrap_err();
        assert!(err.is_not_found());

        let file_id = create_file(pool, &upload("bb")).await.unwrap();
        let err = link_tag(pool, file_id, &TagRef::Id(77)).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
