//! Slash commands and the table that dispatches them.

mod brotato;
mod conch;
mod config;
mod ping;
mod play;
mod sound;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{CommandInteraction, Context, CreateCommand};

use crate::error::{DiscordError, Result};
use crate::state::BotState;

pub use brotato::{Brotato, highscore_caption};
pub use conch::Conch;
pub use config::ConfigCommand;
pub use ping::Ping;
pub use play::{Disconnect, Play, Stop, pick_sound};
pub use sound::{SoundCommand, sound_list_description};

/// A top-level slash command.
#[async_trait]
pub trait SlashCommand: Send + Sync {
    /// Name the command is registered and dispatched under.
    fn name(&self) -> &'static str;

    /// Definition sent to Discord on registration.
    fn register(&self) -> CreateCommand;

    async fn run(&self, ctx: &Context, command: &CommandInteraction, state: &BotState) -> Result<()>;
}

/// Maps command names to their handlers.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, Arc<dyn SlashCommand>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every GustelBot command.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register(Ping)
            .register(Play)
            .register(Stop)
            .register(Disconnect)
            .register(SoundCommand)
            .register(Conch)
            .register(Brotato)
            .register(ConfigCommand);
        registry
    }

    pub fn register(&mut self, command: impl SlashCommand + 'static) -> &mut Self {
        self.commands.insert(command.name(), Arc::new(command));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn SlashCommand>> {
        self.commands.get(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.commands.keys().copied().collect()
    }

    /// Definitions of all registered commands, ordered by name.
    pub fn definitions(&self) -> Vec<CreateCommand> {
        self.commands.values().map(|command| command.register()).collect()
    }

    pub async fn dispatch(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        state: &BotState,
    ) -> Result<()> {
        let handler = self
            .get(&command.data.name)
            .ok_or_else(|| DiscordError::UnknownCommand(command.data.name.clone()))?;
        handler.run(ctx, command, state).await
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}

/// Create all slash commands for registration
pub fn create_commands() -> Vec<CreateCommand> {
    CommandRegistry::with_defaults().definitions()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_registry_has_every_command() {
        let registry = CommandRegistry::with_defaults();
        assert_eq!(
            registry.names(),
            vec![
                "brotato",
                "conch",
                "config",
                "disconnect",
                "ping",
                "play",
                "sound",
                "stop"
            ]
        );
        assert_eq!(create_commands().len(), 8);
        assert!(registry.get("reddit").is_none());
    }
}
