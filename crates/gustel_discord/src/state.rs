use std::sync::Arc;

use gustel_core::BotConfig;
use gustel_db::GustelDb;

use crate::library::SoundLibrary;
use crate::voice::VoiceSessions;

/// Everything a command handler may touch, shared across events.
#[derive(Debug)]
pub struct BotState {
    pub config: BotConfig,
    pub db: GustelDb,
    pub library: SoundLibrary,
    pub voice: Arc<VoiceSessions>,
}

impl BotState {
    pub fn new(config: BotConfig, db: GustelDb, library: SoundLibrary) -> Self {
        Self {
            config,
            db,
            library,
            voice: Arc::new(VoiceSessions::new()),
        }
    }
}
