//! `/sound list` and `/sound upload`.

use async_trait::async_trait;
use gustel_core::upload::{AttachmentInfo, parse_tags, validate_attachment};
use gustel_db::queries::{self, FileQuery};
use serenity::all::{
    Colour, CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
    CreateEmbed,
};
use tracing::info;

use super::SlashCommand;
use crate::error::{DiscordError, Result};
use crate::helpers::{edit_reply, require_guild, respond_embed};
use crate::library::SoundUpload;
use crate::options::CommandArgs;
use crate::state::BotState;

/// Discord's limit for an embed description.
const EMBED_DESCRIPTION_LIMIT: usize = 4096;

/// One name per line, cut off with a count of the rest once `limit` chars are reached.
pub fn sound_list_description(names: &[&str], limit: usize) -> String {
    if names.is_empty() {
        return "No sounds yet. Upload one with `/sound upload`.".to_string();
    }

    let mut out = String::new();
    for (shown, name) in names.iter().enumerate() {
        let remaining = names.len() - shown;
        let footer = format!("\n… and {remaining} more");
        let needed = out.chars().count() + name.chars().count() + 1;
        let fits = if remaining == 1 {
            needed - 1 <= limit
        } else {
            needed + footer.chars().count() <= limit
        };
        if !fits {
            out.push_str(footer.trim_start_matches('\n'));
            return out;
        }
        out.push_str(name);
        out.push('\n');
    }
    out.pop();
    out
}

pub struct SoundCommand;

impl SoundCommand {
    async fn list(&self, ctx: &Context, command: &CommandInteraction, state: &BotState) -> Result<()> {
        let guild_id = require_guild(command)?;
        let files =
            queries::find_files(state.db.pool(), &FileQuery::playable_in(guild_id.get())).await?;
        let names: Vec<&str> = files.iter().map(|f| f.display_name.as_str()).collect();

        let embed = CreateEmbed::new()
            .title(format!("Sounds ({})", names.len()))
            .colour(Colour::from_rgb(100, 150, 200))
            .description(sound_list_description(&names, EMBED_DESCRIPTION_LIMIT));
        respond_embed(ctx, command, embed).await
    }

    async fn upload(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        args: &CommandArgs<'_>,
        state: &BotState,
    ) -> Result<()> {
        let guild_id = require_guild(command)?;
        let attachment = args.required_attachment("sound_file")?;
        let name = args.required_str("sound_name")?;

        validate_attachment(&AttachmentInfo {
            filename: &attachment.filename,
            content_type: attachment.content_type.as_deref(),
            size: u64::from(attachment.size),
        })?;

        command.defer(&ctx.http).await?;

        let bytes = attachment.download().await?;
        let upload = SoundUpload {
            bytes: &bytes,
            filename: &attachment.filename,
            display_name: name,
            tags: args.str("tags").map(parse_tags).unwrap_or_default(),
            public: !args.bool("private").unwrap_or(false),
            guild_id: guild_id.get(),
            uploader_id: command.user.id.get(),
        };

        let outcome = match state.library.import(state.db.pool(), upload).await {
            Ok(outcome) => outcome,
            Err(e) if !e.is_internal() => return edit_reply(ctx, command, e.user_message()).await,
            Err(e) => return Err(e),
        };

        info!(
            user = %command.user.name,
            guild = %guild_id,
            "Upload of {}: {:?}",
            name,
            outcome
        );
        edit_reply(ctx, command, outcome.message(name)).await
    }
}

#[async_trait]
impl SlashCommand for SoundCommand {
    fn name(&self) -> &'static str {
        "sound"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Information and commands regarding sounds")
            .dm_permission(false)
            .add_option(CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "list",
                "Lists all sounds available",
            ))
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "upload",
                    "Uploads sound to GustelBot",
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::Attachment,
                        "sound_file",
                        "Sound file to upload.",
                    )
                    .required(true),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "sound_name",
                        "Name of the sound.",
                    )
                    .required(true),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "tags",
                        "Comma separated list of tags to apply",
                    )
                    .required(false),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::Boolean,
                        "private",
                        "Only show sound on this server",
                    )
                    .required(false),
                ),
            )
    }

    async fn run(&self, ctx: &Context, command: &CommandInteraction, state: &BotState) -> Result<()> {
        let args = CommandArgs::from_command(command);
        match args.path() {
            ["list"] => self.list(ctx, command, state).await,
            ["upload"] => self.upload(ctx, command, &args, state).await,
            _ => Err(DiscordError::UnknownCommand(format!(
                "sound {}",
                args.path().join(" ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn short_list_is_complete() {
        assert_eq!(
            sound_list_description(&["Airhorn", "Ententanz"], 4096),
            "Airhorn\nEntentanz"
        );
    }

    #[test]
    fn long_list_is_cut() {
        let names = ["aaaa", "bbbb", "cccc", "dddd"];
        assert_eq!(sound_list_description(&names, 25), "aaaa\nbbbb\n… and 2 more");
    }

    #[test]
    fn empty_list_hints_upload() {
        assert!(sound_list_description(&[], 4096).contains("/sound upload"));
    }
}
