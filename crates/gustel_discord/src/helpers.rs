//! Reply and permission helpers shared by the command handlers.

use serenity::all::{
    CommandInteraction, Context, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, EditInteractionResponse,
    GuildId, User,
};

use crate::error::{DiscordError, Result};
use crate::state::BotState;

/// Answer the interaction with a plain message.
pub async fn respond(ctx: &Context, command: &CommandInteraction, content: impl Into<String>) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new().content(content),
            ),
        )
        .await?;
    Ok(())
}

/// Answer with a message only the caller sees.
pub async fn respond_ephemeral(
    ctx: &Context,
    command: &CommandInteraction,
    content: impl Into<String>,
) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

pub async fn respond_embed(ctx: &Context, command: &CommandInteraction, embed: CreateEmbed) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(CreateInteractionResponseMessage::new().embed(embed)),
        )
        .await?;
    Ok(())
}

/// Replace the deferred "thinking" reply with `content`.
pub async fn edit_reply(ctx: &Context, command: &CommandInteraction, content: impl Into<String>) -> Result<()> {
    command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(content))
        .await?;
    Ok(())
}

/// Report a failed command to its caller, whether or not it was answered yet.
pub async fn report_error(ctx: &Context, command: &CommandInteraction, error: &DiscordError) {
    let message = error.user_message();
    if respond_ephemeral(ctx, command, message.clone()).await.is_err() {
        let followup = CreateInteractionResponseFollowup::new()
            .content(message)
            .ephemeral(true);
        if let Err(e) = command.create_followup(&ctx.http, followup).await {
            tracing::warn!("Could not report error to user: {}", e);
        }
    }
}

/// Guild the command was run in.
pub fn require_guild(command: &CommandInteraction) -> Result<GuildId> {
    command.guild_id.ok_or(DiscordError::GuildOnly)
}

/// Name a user goes by: server nickname, global display name, account name.
pub fn display_name<'a>(user: &'a User, nick: Option<&'a str>) -> &'a str {
    nick.or(user.global_name.as_deref()).unwrap_or(&user.name)
}

/// Whether a member may change the server configuration.
pub fn may_configure(
    user_id: u64,
    owner_id: u64,
    is_superuser: bool,
    member_roles: &[u64],
    admin_roles: &[u64],
) -> bool {
    user_id == owner_id
        || is_superuser
        || member_roles.iter().any(|role| admin_roles.contains(role))
}

/// Fail with `PermissionDenied` unless the caller may configure this guild:
/// the guild owner, the configured superuser, or a holder of an admin role.
pub async fn ensure_config_permission(
    ctx: &Context,
    command: &CommandInteraction,
    state: &BotState,
) -> Result<()> {
    let guild_id = require_guild(command)?;
    let user_id = command.user.id.get();

    let cached_owner = ctx.cache.guild(guild_id).map(|guild| guild.owner_id);
    let owner_id = match cached_owner {
        Some(owner) => owner,
        None => guild_id.to_partial_guild(&ctx.http).await?.owner_id,
    };

    let member_roles: Vec<u64> = command
        .member
        .as_ref()
        .map(|member| member.roles.iter().map(|role| role.get()).collect())
        .unwrap_or_default();
    let admin_roles =
        gustel_db::queries::list_admin_groups(state.db.pool(), guild_id.get()).await?;

    if may_configure(
        user_id,
        owner_id.get(),
        state.config.discord.is_superuser(user_id),
        &member_roles,
        &admin_roles,
    ) {
        Ok(())
    } else {
        Err(DiscordError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_permission() {
        assert!(may_configure(1, 1, false, &[], &[]));
        assert!(may_configure(2, 1, true, &[], &[]));
        assert!(may_configure(2, 1, false, &[10, 20], &[20]));
        assert!(!may_configure(2, 1, false, &[10], &[20]));
        assert!(!may_configure(2, 1, false, &[], &[]));
    }
}
