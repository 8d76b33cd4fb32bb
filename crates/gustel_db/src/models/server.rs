use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A Discord server (guild) the bot is a member of.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Server {
    /// Guild snowflake
    pub id: i64,

    /// Last seen guild name
    pub name: String,

    /// Reply language code
    pub language: String,

    /// Longest sound random play may pick, in seconds; 0 = unlimited
    pub play_max_duration: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Server {
    pub fn guild_id(&self) -> u64 {
        crate::error::discord_id(self.id)
    }
}
