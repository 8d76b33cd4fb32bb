//! GustelBot Database Layer
//!
//! SQLite storage for servers, users, the sound catalog and Brotato
//! highscores.
//!
//! # Usage
//!
//! ```rust,ignore
//! use gustel_db::{GustelDb, queries};
//!
//! let db = GustelDb::open("data/gustelbot.db").await?;
//! let files = queries::find_files(db.pool(), &queries::FileQuery::playable_in(guild_id)).await?;
//! ```

pub mod connection;
pub mod error;
pub mod models;
pub mod queries;

pub use connection::{DbStats, GustelDb};
pub use error::{DbError, DbResult};
pub use models::{BrotatoCharacter, BrotatoRun, FileRecord, HighscoreRow, Server, Tag, User};
pub use queries::{FileQuery, HighscoreQuery, Highscores, NewRun, NewSoundFile, TagRef};

// Re-export sqlx types for consumers
pub use sqlx::SqlitePool;
