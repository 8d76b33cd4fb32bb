//! `/config`: per-server settings, limited to owner, superuser and bot-admins.

use async_trait::async_trait;
use gustel_db::queries;
use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
};
use tracing::info;

use super::SlashCommand;
use crate::error::{DiscordError, Result};
use crate::helpers::{ensure_config_permission, require_guild, respond};
use crate::options::CommandArgs;
use crate::state::BotState;

/// Upper bound for `/config play maxlength`, in seconds.
pub const MAX_PLAY_LENGTH: i64 = 1800;

pub struct ConfigCommand;

impl ConfigCommand {
    async fn add_group(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        args: &CommandArgs<'_>,
        state: &BotState,
    ) -> Result<()> {
        let guild_id = require_guild(command)?;
        let role = args.required_role("role")?;

        let reply = match queries::add_admin_group(state.db.pool(), guild_id.get(), role.id.get()).await {
            Ok(()) => {
                info!("Role {} is now bot-admin in guild {}", role.name, guild_id);
                format!("Added group {} to bot-admins.", role.name)
            }
            Err(e) if e.is_already_exists() => {
                format!("{} already registered as bot-admin.", role.name)
            }
            Err(e) => return Err(e.into()),
        };
        respond(ctx, command, reply).await
    }

    async fn remove_group(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        args: &CommandArgs<'_>,
        state: &BotState,
    ) -> Result<()> {
        let guild_id = require_guild(command)?;
        let role = args.required_role("role")?;

        let reply =
            match queries::remove_admin_group(state.db.pool(), guild_id.get(), role.id.get()).await {
                Ok(()) => format!("Group {} is no longer registered as bot-admin.", role.name),
                Err(e) if e.is_not_found() => {
                    format!("Group {} is not registered as bot-admin.", role.name)
                }
                Err(e) => return Err(e.into()),
            };
        respond(ctx, command, reply).await
    }

    async fn max_length(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        args: &CommandArgs<'_>,
        state: &BotState,
    ) -> Result<()> {
        let guild_id = require_guild(command)?;
        let seconds = args.required_int("seconds")?.clamp(0, MAX_PLAY_LENGTH) as u64;
        let pool = state.db.pool();

        if queries::get_server(pool, guild_id.get()).await?.is_none() {
            let name = guild_id
                .name(&ctx.cache)
                .unwrap_or_else(|| guild_id.to_string());
            queries::upsert_server(pool, guild_id.get(), &name).await?;
        }
        queries::set_play_max_duration(pool, guild_id.get(), seconds).await?;

        info!("Guild {} limits random sounds to {}s", guild_id, seconds);
        respond(
            ctx,
            command,
            format!("Max length of randomly chosen tracks set to {seconds} seconds."),
        )
        .await
    }
}

#[async_trait]
impl SlashCommand for ConfigCommand {
    fn name(&self) -> &'static str {
        "config"
    }

    fn register(&self) -> CreateCommand {
        let role_option = || {
            CreateCommandOption::new(CommandOptionType::Role, "role", "Discord role")
                .required(true)
        };

        CreateCommand::new(self.name())
            .description("Change bot settings for this server")
            .dm_permission(false)
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommandGroup,
                    "admin",
                    "Roles allowed to change bot settings",
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::SubCommand,
                        "addgroup",
                        "Register a role as bot-admin",
                    )
                    .add_sub_option(role_option()),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::SubCommand,
                        "remgroup",
                        "Remove a role from the bot-admins",
                    )
                    .add_sub_option(role_option()),
                ),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommandGroup,
                    "play",
                    "Settings for /play",
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::SubCommand,
                        "maxlength",
                        "Longest sound chosen by a random /play (0 = no limit)",
                    )
                    .add_sub_option(
                        CreateCommandOption::new(
                            CommandOptionType::Integer,
                            "seconds",
                            "Length in seconds",
                        )
                        .min_int_value(0)
                        .max_int_value(MAX_PLAY_LENGTH as u64)
                        .required(true),
                    ),
                ),
            )
    }

    async fn run(&self, ctx: &Context, command: &CommandInteraction, state: &BotState) -> Result<()> {
        ensure_config_permission(ctx, command, state).await?;

        let args = CommandArgs::from_command(command);
        match args.path() {
            ["admin", "addgroup"] => self.add_group(ctx, command, &args, state).await,
            ["admin", "remgroup"] => self.remove_group(ctx, command, &args, state).await,
            ["play", "maxlength"] => self.max_length(ctx, command, &args, state).await,
            _ => Err(DiscordError::UnknownCommand(format!(
                "config {}",
                args.path().join(" ")
            ))),
        }
    }
}
