//! GustelBot Discord integration
//!
//! Slash commands, voice playback and the sound library behind them.
//! Configuration is loaded once by the binary and handed in through
//! [`BotState`]; nothing in this crate reads the environment.

pub mod bot;
pub mod commands;
pub mod error;
pub mod helpers;
pub mod library;
pub mod options;
pub mod state;
pub mod voice;

pub use bot::{GustelBot, GustelEventHandler};
pub use commands::{CommandRegistry, SlashCommand, create_commands};
pub use error::{DiscordError, Result};
pub use library::{SoundLibrary, SoundUpload, SyncReport, UploadOutcome};
pub use state::BotState;
pub use voice::VoiceSessions;

// Re-export serenity for convenience
pub use serenity;
