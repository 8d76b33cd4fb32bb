//! Gateway client and event handling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use gustel_db::queries;
use serenity::all::{
    ActivityData, Command, Context, EventHandler, GatewayIntents, Guild, GuildId, Interaction,
    PartialGuild, Ready, VoiceState,
};
use serenity::Client;
use songbird::SerenityInit;
use tracing::{debug, error, info, warn};

use crate::commands::CommandRegistry;
use crate::error::Result;
use crate::helpers::{display_name, report_error};
use crate::state::BotState;

/// How often the known guilds are written back to the database.
pub const GUILD_SYNC_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// The bot: shared state plus the commands it answers.
#[derive(Debug, Clone)]
pub struct GustelBot {
    state: Arc<BotState>,
    commands: Arc<CommandRegistry>,
}

impl GustelBot {
    pub fn new(state: BotState) -> Self {
        Self::with_commands(state, CommandRegistry::with_defaults())
    }

    pub fn with_commands(state: BotState, commands: CommandRegistry) -> Self {
        Self {
            state: Arc::new(state),
            commands: Arc::new(commands),
        }
    }

    pub fn state(&self) -> &Arc<BotState> {
        &self.state
    }

    /// Connect to the gateway and serve until the connection ends or ctrl-c.
    pub async fn run(self) -> Result<()> {
        let token = self.state.config.discord.token.clone();
        let intents = GatewayIntents::non_privileged();
        let handler = GustelEventHandler::new(self);

        let mut client = Client::builder(&token, intents)
            .event_handler(handler)
            .register_songbird()
            .await?;
        info!("Created Discord client");

        tokio::select! {
            res = client.start() => {
                res?;
                info!("Discord client stopped");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C; shutting down");
                client.shard_manager.shutdown_all().await;
            }
        }
        Ok(())
    }
}

pub struct GustelEventHandler {
    bot: GustelBot,
    sync_started: AtomicBool,
}

impl GustelEventHandler {
    pub fn new(bot: GustelBot) -> Self {
        Self {
            bot,
            sync_started: AtomicBool::new(false),
        }
    }

    async fn register_commands(&self, ctx: &Context) {
        let debug_guilds = &self.bot.state.config.discord.debug_guilds;
        if debug_guilds.is_empty() {
            match Command::set_global_commands(&ctx.http, self.bot.commands.definitions()).await {
                Ok(registered) => info!("Registered {} global commands", registered.len()),
                Err(e) => error!("Failed to register global commands: {}", e),
            }
            return;
        }

        for guild in debug_guilds {
            let guild_id = GuildId::new(*guild);
            match guild_id
                .set_commands(&ctx.http, self.bot.commands.definitions())
                .await
            {
                Ok(registered) => info!(
                    "Registered {} commands in debug guild {}",
                    registered.len(),
                    guild_id
                ),
                Err(e) => error!("Failed to register commands in {}: {}", guild_id, e),
            }
        }
    }

    /// Write every guild the bot is in to the database, once per interval.
    fn start_guild_sync(&self, ctx: &Context) {
        if self.sync_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let ctx = ctx.clone();
        let state = Arc::clone(&self.bot.state);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(GUILD_SYNC_INTERVAL);
            loop {
                interval.tick().await;
                let guilds: Vec<(GuildId, String)> = ctx
                    .cache
                    .guilds()
                    .into_iter()
                    .filter_map(|id| id.name(&ctx.cache).map(|name| (id, name)))
                    .collect();

                for (guild_id, name) in &guilds {
                    if let Err(e) = queries::upsert_server(state.db.pool(), guild_id.get(), name).await {
                        warn!("Guild sync failed for {}: {}", guild_id, e);
                    }
                }
                debug!("Synced {} guilds", guilds.len());
            }
        });
    }

    async fn sync_library(&self) {
        match self.bot.state.library.sync(self.bot.state.db.pool()).await {
            Ok(report) => info!("Sound library synced: {:?}", report),
            Err(e) => error!("Sound library sync failed: {}", e),
        }
    }

    async fn save_server(&self, guild_id: GuildId, name: &str) {
        if let Err(e) = queries::upsert_server(self.bot.state.db.pool(), guild_id.get(), name).await {
            warn!("Failed to save guild {}: {}", guild_id, e);
        }
    }
}

#[async_trait]
impl EventHandler for GustelEventHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Connected as {}", ready.user.name);

        ctx.set_activity(Some(ActivityData::listening("Alexander Marcus")));
        self.register_commands(&ctx).await;

        if !self.sync_started.load(Ordering::SeqCst) {
            self.sync_library().await;
        }
        self.start_guild_sync(&ctx);
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: Option<bool>) {
        self.save_server(guild.id, &guild.name).await;
    }

    async fn guild_update(&self, _ctx: Context, _old: Option<Guild>, new: PartialGuild) {
        self.save_server(new.id, &new.name).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };
        let state = &self.bot.state;

        let user = &command.user;
        if let Err(e) = queries::upsert_user(state.db.pool(), user.id.get(), &user.name).await {
            warn!("Failed to save user {}: {}", user.id, e);
        } else if let Some(guild_id) = command.guild_id {
            let nick = command.member.as_ref().and_then(|m| m.nick.as_deref());
            if let Err(e) = queries::upsert_display_name(
                state.db.pool(),
                user.id.get(),
                guild_id.get(),
                display_name(user, nick),
            )
            .await
            {
                warn!("Failed to save display name of {}: {}", user.id, e);
            }
        }

        debug!("/{} from {}", command.data.name, user.name);
        if let Err(e) = self.bot.commands.dispatch(&ctx, &command, state).await {
            if e.is_internal() {
                error!("/{} failed: {:?}", command.data.name, e);
            } else {
                debug!("/{} rejected: {}", command.data.name, e);
            }
            report_error(&ctx, &command, &e).await;
        }
    }

    async fn voice_state_update(&self, ctx: Context, _old: Option<VoiceState>, new: VoiceState) {
        if new.user_id != ctx.cache.current_user().id {
            return;
        }
        let Some(guild_id) = new.guild_id else {
            return;
        };

        let voice = &self.bot.state.voice;
        if new.channel_id.is_some() {
            voice.watch_idle(ctx, guild_id);
        } else {
            voice.forget(guild_id);
        }
    }
}
