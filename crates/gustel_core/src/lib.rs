//! GustelBot Core
//!
//! Domain types and the pieces of the bot that do not talk to Discord or the
//! database:
//!
//! - [`sound`]: the `SoundFile` record and visibility rules
//! - [`resolver`]: fuzzy sound selection (search, ranking, near-tie randomness)
//! - [`config`]: `BotConfig`, loaded once at start and passed down explicitly
//! - [`upload`]: validation of uploaded attachments and tag parsing
//! - [`probe`] / [`hash`]: audio duration probing and content fingerprints
//! - [`table`]: monospace table rendering for chat replies

pub mod config;
pub mod conch;
pub mod error;
pub mod hash;
pub mod probe;
pub mod resolver;
pub mod sound;
pub mod table;
pub mod upload;

pub use config::{BotConfig, DatabaseConfig, DiscordConfig, LogLevel, StorageConfig};
pub use error::{ConfigError, CoreError, ProbeError, ResolveError, Result, UploadError};
pub use probe::{DurationProbe, SymphoniaProbe};
pub use resolver::{ResolveRequest, resolve, resolve_with_rng, similarity};
pub use sound::SoundFile;
