use async_trait::async_trait;
use gustel_core::conch::ConchAnswer;
use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
};
use tracing::debug;

use super::SlashCommand;
use crate::error::Result;
use crate::helpers::respond;
use crate::options::CommandArgs;
use crate::state::BotState;
use crate::voice::VoiceSessions;

/// Ask the magic conch shell. Speaks the answer when the caller is in voice
/// and nothing else is playing.
pub struct Conch;

#[async_trait]
impl SlashCommand for Conch {
    fn name(&self) -> &'static str {
        "conch"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Ask the magic conch shell")
            .name_localized("de", "muschel")
            .description_localized("de", "Frag die magische Miesmuschel")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "question",
                    "What do you want to know?",
                )
                .name_localized("de", "frage")
                .description_localized("de", "Was willst du wissen?")
                .required(false),
            )
    }

    async fn run(&self, ctx: &Context, command: &CommandInteraction, state: &BotState) -> Result<()> {
        let args = CommandArgs::from_command(command);
        let answer = {
            let mut rng = rand::rng();
            ConchAnswer::draw(&mut rng)
        };

        respond(ctx, command, answer.reply(args.str("question"))).await?;

        let Some(guild_id) = command.guild_id else {
            return Ok(());
        };
        let Ok(channel_id) = VoiceSessions::joinable_channel(ctx, guild_id, command.user.id) else {
            return Ok(());
        };
        if state.voice.is_playing(guild_id).await {
            debug!("Conch stays silent, guild {} is playing", guild_id);
            return Ok(());
        }

        let clip = answer.clip_path(state.library.default_dir());
        state.voice.play(ctx, guild_id, channel_id, &clip).await
    }
}
