//! `/play`, `/stop` and `/disconnect`.

use async_trait::async_trait;
use gustel_core::resolver::resolve_with_rng;
use gustel_core::{ResolveError, ResolveRequest, SoundFile};
use gustel_db::queries::{self, FileQuery};
use rand::Rng;
use serenity::all::{CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption};
use tracing::debug;

use super::SlashCommand;
use crate::error::{DiscordError, Result};
use crate::helpers::{require_guild, respond};
use crate::options::CommandArgs;
use crate::state::BotState;
use crate::voice::VoiceSessions;

/// Choose the sound `/play` should play.
///
/// Without a name a random sound within the server's length limit is
/// picked. A name is searched without length limit; when nothing matches it
/// is tried as a tag, again within the length limit.
pub fn pick_sound<'a, R: Rng + ?Sized>(
    files: &'a [SoundFile],
    guild_id: u64,
    name: Option<&str>,
    max_length: u64,
    rng: &mut R,
) -> std::result::Result<Option<&'a SoundFile>, ResolveError> {
    let limit = i64::try_from(max_length).unwrap_or(i64::MAX);
    let base = ResolveRequest::new().guild(guild_id);

    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return resolve_with_rng(files, &base.max_duration(limit), rng);
    };

    if let Some(found) = resolve_with_rng(files, &base.search(name), rng)? {
        return Ok(Some(found));
    }

    let tag = [name.to_lowercase()];
    resolve_with_rng(files, &base.max_duration(limit).tags(&tag), rng)
}

pub struct Play;

#[async_trait]
impl SlashCommand for Play {
    fn name(&self) -> &'static str {
        "play"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Plays sound in your current channel.")
            .dm_permission(false)
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "sound_name",
                    "Name of the sound, leave empty for random choice",
                )
                .required(false),
            )
    }

    async fn run(&self, ctx: &Context, command: &CommandInteraction, state: &BotState) -> Result<()> {
        let guild_id = require_guild(command)?;
        let channel_id = VoiceSessions::joinable_channel(ctx, guild_id, command.user.id)?;

        let args = CommandArgs::from_command(command);
        let pool = state.db.pool();
        let files = queries::find_files(pool, &FileQuery::playable_in(guild_id.get())).await?;
        let max_length = queries::get_play_max_duration(pool, guild_id.get()).await?;

        let sound = {
            let mut rng = rand::rng();
            pick_sound(&files, guild_id.get(), args.str("sound_name"), max_length, &mut rng)?
                .cloned()
        };

        let Some(sound) = sound else {
            return respond(ctx, command, "No sound found").await;
        };

        debug!("Resolved {:?} to {}", args.str("sound_name"), sound.display_name);
        respond(ctx, command, format!("Playing '{}'", sound.display_name)).await?;
        state
            .voice
            .play(ctx, guild_id, channel_id, &state.library.path_of(&sound))
            .await
    }
}

pub struct Stop;

#[async_trait]
impl SlashCommand for Stop {
    fn name(&self) -> &'static str {
        "stop"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Stops playback")
            .dm_permission(false)
    }

    async fn run(&self, ctx: &Context, command: &CommandInteraction, state: &BotState) -> Result<()> {
        let guild_id = require_guild(command)?;
        state.voice.stop(ctx, guild_id).await?;
        respond(ctx, command, "⏹️ Playback stopped!").await
    }
}

pub struct Disconnect;

#[async_trait]
impl SlashCommand for Disconnect {
    fn name(&self) -> &'static str {
        "disconnect"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Disconnects bot from channel.")
            .dm_permission(false)
    }

    async fn run(&self, ctx: &Context, command: &CommandInteraction, state: &BotState) -> Result<()> {
        let guild_id = require_guild(command)?;
        if !VoiceSessions::is_connected(ctx, guild_id).await {
            return Err(DiscordError::NotConnected);
        }
        respond(ctx, command, "Disconnecting...").await?;
        state.voice.leave(ctx, guild_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn sound(id: i64, name: &str, seconds: u64, tags: &[&str]) -> SoundFile {
        SoundFile {
            id,
            display_name: name.to_string(),
            file_name: format!("{id}.mp3"),
            content_hash: format!("{id:x}"),
            duration_seconds: seconds,
            size_bytes: 100,
            owner_guild_id: Some(1),
            uploader_id: None,
            public: true,
            tags: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
            deleted: false,
        }
    }

    fn library() -> Vec<SoundFile> {
        vec![
            sound(1, "Airhorn", 3, &["meme"]),
            sound(2, "Ententanz", 120, &["musik"]),
            sound(3, "Polonaise", 240, &["musik"]),
        ]
    }

    #[test]
    fn named_sound_ignores_length_limit() {
        let files = library();
        let mut rng = StdRng::seed_from_u64(1);
        let found = pick_sound(&files, 1, Some("ententanz"), 10, &mut rng).unwrap();
        assert_eq!(found.map(|f| f.id), Some(2));
    }

    #[test]
    fn random_sound_respects_limit() {
        let files = library();
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            let found = pick_sound(&files, 1, Some("  "), 10, &mut rng).unwrap();
            assert_eq!(found.map(|f| f.id), Some(1));
        }
    }

    #[test]
    fn unknown_name_falls_back_to_tag() {
        let files = library();
        let mut rng = StdRng::seed_from_u64(3);

        let found = pick_sound(&files, 1, Some("Musik"), 0, &mut rng).unwrap();
        assert!(matches!(found.map(|f| f.id), Some(2 | 3)));

        let limited = pick_sound(&files, 1, Some("musik"), 200, &mut rng).unwrap();
        assert_eq!(limited.map(|f| f.id), Some(2));

        assert!(pick_sound(&files, 1, Some("xylophon"), 0, &mut rng).unwrap().is_none());
    }
}
