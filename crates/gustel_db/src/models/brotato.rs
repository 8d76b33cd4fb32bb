//! Brotato highscore models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A playable Brotato character.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct BrotatoCharacter {
    pub id: i64,

    /// German name, shown in tables
    pub name_de: String,

    /// English name, accepted as an alias
    pub name_en: Option<String>,
}

/// A recorded run.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BrotatoRun {
    pub id: i64,
    pub user_id: i64,
    pub server_id: i64,
    pub character_id: i64,

    /// Highest wave reached
    pub wave: i64,

    /// Danger level the run was played on
    pub danger: i64,

    pub created_at: DateTime<Utc>,
}

/// One line of a highscore listing, before filtered columns are dropped.
#[derive(Debug, Clone, FromRow)]
pub struct HighscoreRow {
    pub player: String,
    pub wave: i64,
    pub danger: i64,
    pub character: String,
}
