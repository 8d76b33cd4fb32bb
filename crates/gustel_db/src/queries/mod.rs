//! Database query functions.
//!
//! Organized by domain:
//! - `server`: guilds and their settings
//! - `user`: users and per-server display names
//! - `admin`: roles allowed to configure a server
//! - `file`: the sound catalog
//! - `tag`: sound tags
//! - `brotato`: Brotato characters, runs and highscores

mod admin;
mod brotato;
mod file;
mod server;
mod tag;
mod user;

pub use admin::*;
pub use brotato::*;
pub use file::*;
pub use server::*;
pub use tag::*;
pub use user::*;
