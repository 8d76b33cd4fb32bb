//! Stored sound file rows.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use gustel_core::SoundFile;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::discord_id;

/// A row of the `files` table, without its tags.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub display_name: String,
    pub file_name: String,
    pub content_hash: String,
    pub duration_seconds: i64,
    pub size_bytes: i64,
    pub owner_guild_id: Option<i64>,
    pub uploader_id: Option<i64>,
    pub public: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    /// Combine the row with its tags into the domain record.
    pub fn into_sound_file(self, tags: BTreeSet<String>) -> SoundFile {
        SoundFile {
            id: self.id,
            display_name: self.display_name,
            file_name: self.file_name,
            content_hash: self.content_hash,
            duration_seconds: self.duration_seconds.max(0) as u64,
            size_bytes: self.size_bytes.max(0) as u64,
            owner_guild_id: self.owner_guild_id.map(discord_id),
            uploader_id: self.uploader_id.map(discord_id),
            public: self.public,
            tags,
            deleted: self.deleted,
        }
    }
}
