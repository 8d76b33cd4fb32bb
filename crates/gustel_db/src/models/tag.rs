use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A sound tag. Names are stored lowercase and are unique.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}
