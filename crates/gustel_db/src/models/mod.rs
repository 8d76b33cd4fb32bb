//! Row types for the bot's tables.

mod brotato;
mod file;
mod server;
mod tag;
mod user;

pub use brotato::{BrotatoCharacter, BrotatoRun, HighscoreRow};
pub use file::FileRecord;
pub use server::Server;
pub use tag::Tag;
pub use user::User;
