//! Brotato character, run and highscore queries.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{DbError, DbResult, sql_id};
use crate::models::{BrotatoCharacter, BrotatoRun, HighscoreRow};

/// Number of runs shown in a highscore listing.
pub const HIGHSCORE_LIMIT: i64 = 20;

/// A run about to be recorded.
#[derive(Debug, Clone)]
pub struct NewRun {
    /// Character name, German or English
    pub character: String,
    pub wave: u32,
    pub danger: u8,
    pub user_id: u64,
    pub server_id: u64,
}

/// Filters for [`highscores`].
#[derive(Debug, Clone)]
pub struct HighscoreQuery {
    pub server_id: u64,
    pub danger: Option<u8>,
    pub character: Option<String>,
}

/// A highscore listing. Columns a filter pins to one value are left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highscores {
    pub heading: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

pub async fn list_characters(pool: &SqlitePool) -> DbResult<Vec<BrotatoCharacter>> {
    let characters =
        sqlx::query_as::<_, BrotatoCharacter>("SELECT * FROM brotato_characters ORDER BY name_de")
            .fetch_all(pool)
            .await?;
    Ok(characters)
}

/// Find a character by German or English name, ignoring case.
pub async fn get_character(pool: &SqlitePool, name: &str) -> DbResult<Option<BrotatoCharacter>> {
    let character = sqlx::query_as::<_, BrotatoCharacter>(
        r#"
        SELECT * FROM brotato_characters
        WHERE name_de = ?1 COLLATE NOCASE OR name_en = ?1 COLLATE NOCASE
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(name.trim())
    .fetch_optional(pool)
    .await?;
    Ok(character)
}

/// Add a character under its German name.
pub async fn add_character(pool: &SqlitePool, name: &str) -> DbResult<BrotatoCharacter> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DbError::invalid_data("character name must not be empty"));
    }
    if get_character(pool, name).await?.is_some() {
        return Err(DbError::already_exists("brotato character", name));
    }

    let character = sqlx::query_as::<_, BrotatoCharacter>(
        "INSERT INTO brotato_characters (name_de) VALUES (?) RETURNING *",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(character)
}

/// Record a run. The character must exist, the user row must exist.
pub async fn add_run(pool: &SqlitePool, run: &NewRun) -> DbResult<BrotatoRun> {
    if run.wave < 1 {
        return Err(DbError::invalid_data("wave must be at least 1"));
    }

    let character = get_character(pool, &run.character)
        .await?
        .ok_or_else(|| DbError::not_found("brotato character", &run.character))?;

    let stored = sqlx::query_as::<_, BrotatoRun>(
        r#"
        INSERT INTO brotato_runs (user_id, server_id, character_id, wave, danger, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(sql_id(run.user_id))
    .bind(sql_id(run.server_id))
    .bind(character.id)
    .bind(i64::from(run.wave))
    .bind(i64::from(run.danger))
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(stored)
}

/// Best runs of a server by wave, optionally for one danger level and character.
pub async fn highscores(pool: &SqlitePool, query: &HighscoreQuery) -> DbResult<Highscores> {
    let character_id = match &query.character {
        Some(name) => Some(
            get_character(pool, name)
                .await?
                .ok_or_else(|| DbError::not_found("brotato character", name))?
                .id,
        ),
        None => None,
    };

    let rows = sqlx::query_as::<_, HighscoreRow>(
        r#"
        SELECT
            COALESCE(d.display_name, u.name) AS player,
            r.wave,
            r.danger,
            c.name_de AS character
        FROM brotato_runs r
        JOIN users u ON u.id = r.user_id
        JOIN brotato_characters c ON c.id = r.character_id
        LEFT JOIN user_display_names d
            ON d.user_id = r.user_id AND d.server_id = r.server_id
        WHERE r.server_id = ?1
          AND (?2 IS NULL OR r.danger = ?2)
          AND (?3 IS NULL OR r.character_id = ?3)
        ORDER BY r.wave DESC, r.id ASC
        LIMIT ?4
        "#,
    )
    .bind(sql_id(query.server_id))
    .bind(query.danger.map(i64::from))
    .bind(character_id)
    .bind(HIGHSCORE_LIMIT)
    .fetch_all(pool)
    .await?;

    let show_danger = query.danger.is_none();
    let show_character = character_id.is_none();

    let mut heading = vec!["Spieler", "Welle"];
    if show_danger {
        heading.push("Gefahr");
    }
    if show_character {
        heading.push("Charakter");
    }

    let rows = rows
        .into_iter()
        .map(|row| {
            let mut cells = vec![row.player, row.wave.to_string()];
            if show_danger {
                cells.push(row.danger.to_string());
            }
            if show_character {
                cells.push(row.character);
            }
            cells
        })
        .collect();

    Ok(Highscores { heading, rows })
}
