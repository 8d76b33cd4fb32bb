use std::time::Instant;

use async_trait::async_trait;
use serenity::all::{CommandInteraction, Context, CreateCommand};

use super::SlashCommand;
use crate::error::Result;
use crate::helpers::respond;
use crate::state::BotState;

/// `/ping`: round trip time of a REST call.
pub struct Ping;

#[async_trait]
impl SlashCommand for Ping {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name()).description("Replies with the bot's latency.")
    }

    async fn run(&self, ctx: &Context, command: &CommandInteraction, _state: &BotState) -> Result<()> {
        let started = Instant::now();
        ctx.http.get_current_user().await?;
        let latency = started.elapsed().as_millis();

        respond(ctx, command, format!("Latency: {latency}ms")).await
    }
}
