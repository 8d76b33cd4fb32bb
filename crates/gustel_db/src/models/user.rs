use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A Discord user, with the name to show in a given server.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Server display name when one is known, the account name otherwise
    pub name: String,

    pub updated_at: DateTime<Utc>,
}
