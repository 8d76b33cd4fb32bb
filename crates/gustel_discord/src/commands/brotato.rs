//! `/brotato`: runs and highscores for the game Brotato.

use async_trait::async_trait;
use gustel_core::table::format_table;
use gustel_db::queries::{self, HighscoreQuery, NewRun};
use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
};
use tracing::info;

use super::SlashCommand;
use crate::error::{DiscordError, Result};
use crate::helpers::{display_name, require_guild, respond};
use crate::options::CommandArgs;
use crate::state::BotState;

const MAX_DANGER: i64 = 5;

/// First line of a highscore reply, naming the active filters.
pub fn highscore_caption(danger: Option<i64>, character: Option<&str>) -> String {
    let danger = danger.map_or_else(|| "alle".to_string(), |d| d.to_string());
    format!(
        "Gefahr: `{}`, Charakter: `{}`",
        danger,
        character.unwrap_or("alle")
    )
}

fn danger_option() -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::Integer, "danger", "Gefahrenstufe")
        .min_int_value(0)
        .max_int_value(MAX_DANGER as u64)
}

fn character_option() -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, "character", "Charakter")
}

pub struct Brotato;

impl Brotato {
    async fn highscore(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        args: &CommandArgs<'_>,
        state: &BotState,
    ) -> Result<()> {
        let guild_id = require_guild(command)?;
        let danger = args.int("danger");
        let character = args.str("character");

        let query = HighscoreQuery {
            server_id: guild_id.get(),
            danger: danger.map(|d| d.clamp(0, MAX_DANGER) as u8),
            character: character.map(str::to_string),
        };
        let scores = match queries::highscores(state.db.pool(), &query).await {
            Ok(scores) => scores,
            Err(e) if e.is_not_found() => {
                let name = character.unwrap_or_default();
                return respond(ctx, command, format!("'{name}' is an unknown character")).await;
            }
            Err(e) => return Err(e.into()),
        };

        let table = if scores.rows.is_empty() {
            "```\nNichts passendes gefunden\n```".to_string()
        } else {
            format_table(&scores.heading, &scores.rows)
        };
        respond(
            ctx,
            command,
            format!("{}\n{}", highscore_caption(danger, character), table),
        )
        .await
    }

    async fn add_run(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        args: &CommandArgs<'_>,
        state: &BotState,
    ) -> Result<()> {
        let guild_id = require_guild(command)?;
        let character = args.required_str("character")?;
        let wave = args.required_int("wave")?;
        let danger = args.required_int("danger")?;

        let (player, nick) = match args.user("user") {
            Some((user, member)) => (user, member.and_then(|m| m.nick.as_deref())),
            None => (
                &command.user,
                command.member.as_ref().and_then(|m| m.nick.as_deref()),
            ),
        };

        let pool = state.db.pool();
        queries::upsert_user(pool, player.id.get(), &player.name).await?;
        queries::upsert_display_name(
            pool,
            player.id.get(),
            guild_id.get(),
            display_name(player, nick),
        )
        .await?;

        let run = NewRun {
            character: character.to_string(),
            wave: u32::try_from(wave).unwrap_or(0),
            danger: danger.clamp(0, MAX_DANGER) as u8,
            user_id: player.id.get(),
            server_id: guild_id.get(),
        };
        match queries::add_run(pool, &run).await {
            Ok(saved) => {
                info!(
                    "Brotato run {} for {} in guild {}",
                    saved.id, player.name, guild_id
                );
                respond(
                    ctx,
                    command,
                    format!(
                        "**Run hinzugefügt:**\nCharakter: `{}`, Welle: `{}`, Gefahr: `{}`",
                        character, saved.wave, saved.danger
                    ),
                )
                .await
            }
            Err(e) if e.is_not_found() => {
                respond(ctx, command, format!("'{character}' is an unknown character")).await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn add_char(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        args: &CommandArgs<'_>,
        state: &BotState,
    ) -> Result<()> {
        let character = args.required_str("character")?;
        let reply = match queries::add_character(state.db.pool(), character).await {
            Ok(added) => format!("Added new char '{}'", added.name_de),
            Err(e) if e.is_already_exists() => format!("Character '{character}' already exists."),
            Err(e) => return Err(e.into()),
        };
        respond(ctx, command, reply).await
    }
}

#[async_trait]
impl SlashCommand for Brotato {
    fn name(&self) -> &'static str {
        "brotato"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Brotato runs and highscores")
            .dm_permission(false)
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "highscore",
                    "Zeigt die besten Runs",
                )
                .add_sub_option(danger_option())
                .add_sub_option(character_option()),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommandGroup,
                    "add",
                    "Runs und Charaktere eintragen",
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::SubCommand,
                        "run",
                        "Trägt einen Run ein",
                    )
                    .add_sub_option(character_option().required(true))
                    .add_sub_option(
                        CreateCommandOption::new(CommandOptionType::Integer, "wave", "Welle")
                            .min_int_value(1)
                            .required(true),
                    )
                    .add_sub_option(danger_option().required(true))
                    .add_sub_option(CreateCommandOption::new(
                        CommandOptionType::User,
                        "user",
                        "Spieler, falls nicht du selbst",
                    )),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::SubCommand,
                        "char",
                        "Fügt einen Charakter hinzu",
                    )
                    .add_sub_option(character_option().required(true)),
                ),
            )
    }

    async fn run(&self, ctx: &Context, command: &CommandInteraction, state: &BotState) -> Result<()> {
        let args = CommandArgs::from_command(command);
        match args.path() {
            ["highscore"] => self.highscore(ctx, command, &args, state).await,
            ["add", "run"] => self.add_run(ctx, command, &args, state).await,
            ["add", "char"] => self.add_char(ctx, command, &args, state).await,
            _ => Err(DiscordError::UnknownCommand(format!(
                "brotato {}",
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
    fn caption_defaults_to_all() {
        assert_eq!(
            highscore_caption(None, None),
            "Gefahr: `alle`, Charakter: `alle`"
        );
        assert_eq!(
            highscore_caption(Some(3), Some("Glücksritter")),
            "Gefahr: `3`, Charakter: `Glücksritter`"
        );
    }
}
