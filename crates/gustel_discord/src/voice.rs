//! Voice connections and playback, one call per guild.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serenity::all::{ChannelId, Context, GuildId, UserId};
use songbird::Songbird;
use songbird::tracks::{PlayMode, TrackHandle};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{DiscordError, Result};

/// Silence after which the bot leaves its voice channel.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(180);

const IDLE_POLL: Duration = Duration::from_secs(10);

/// Measures how long a call has gone without playback.
#[derive(Debug, Clone)]
pub struct IdleClock {
    timeout: Duration,
    silent_since: Option<Instant>,
}

impl IdleClock {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            silent_since: None,
        }
    }

    /// Record one observation; returns true once silence has lasted the timeout.
    pub fn observe(&mut self, playing: bool, now: Instant) -> bool {
        if playing {
            self.silent_since = None;
            return false;
        }
        let since = *self.silent_since.get_or_insert(now);
        now.duration_since(since) >= self.timeout
    }
}

/// Whether a channel with `occupants` users has no room for the bot.
///
/// A limit of zero or none means unlimited. The bot never counts a channel
/// it already sits in as full.
pub fn is_channel_full(user_limit: Option<u32>, occupants: usize, bot_present: bool) -> bool {
    match user_limit {
        Some(limit) if limit > 0 => !bot_present && occupants >= limit as usize,
        _ => false,
    }
}

/// Current tracks and idle watchers by guild.
#[derive(Debug, Default)]
pub struct VoiceSessions {
    tracks: DashMap<GuildId, TrackHandle>,
    watchers: DashMap<GuildId, JoinHandle<()>>,
}

impl VoiceSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The voice channel `user_id` sits in, if the bot may join it.
    pub fn joinable_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Result<ChannelId> {
        let bot_id = ctx.cache.current_user().id;
        let guild = ctx.cache.guild(guild_id).ok_or(DiscordError::GuildOnly)?;

        let channel_id = guild
            .voice_states
            .get(&user_id)
            .and_then(|state| state.channel_id)
            .ok_or(DiscordError::NotInVoice)?;

        let occupants = guild
            .voice_states
            .values()
            .filter(|state| state.channel_id == Some(channel_id))
            .count();
        let bot_present = guild
            .voice_states
            .get(&bot_id)
            .and_then(|state| state.channel_id)
            == Some(channel_id);
        let user_limit = guild
            .channels
            .get(&channel_id)
            .and_then(|channel| channel.user_limit);

        if is_channel_full(user_limit, occupants, bot_present) {
            return Err(DiscordError::ChannelFull);
        }
        Ok(channel_id)
    }

    async fn manager(ctx: &Context) -> Result<Arc<Songbird>> {
        songbird::get(ctx).await.ok_or(DiscordError::VoiceUnavailable)
    }

    /// Join `channel_id` (moving if already elsewhere) and play `path`,
    /// replacing whatever was playing.
    pub async fn play(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
        path: &Path,
    ) -> Result<()> {
        let manager = Self::manager(ctx).await?;
        let call = manager.join(guild_id, channel_id).await?;

        let track = {
            let mut handler = call.lock().await;
            handler.stop();
            handler.play_input(songbird::input::File::new(path.to_path_buf()).into())
        };

        debug!("Playing {} in guild {}", path.display(), guild_id);
        self.tracks.insert(guild_id, track);
        Ok(())
    }

    /// Whether a track started by the bot is still playing in `guild_id`.
    pub async fn is_playing(&self, guild_id: GuildId) -> bool {
        let Some(track) = self.tracks.get(&guild_id).map(|t| t.value().clone()) else {
            return false;
        };
        match track.get_info().await {
            Ok(state) => matches!(state.playing, PlayMode::Play),
            Err(_) => false,
        }
    }

    pub async fn is_connected(ctx: &Context, guild_id: GuildId) -> bool {
        match Self::manager(ctx).await {
            Ok(manager) => manager.get(guild_id).is_some(),
            Err(_) => false,
        }
    }

    /// Stop playback, staying in the channel.
    pub async fn stop(&self, ctx: &Context, guild_id: GuildId) -> Result<()> {
        let manager = Self::manager(ctx).await?;
        let call = manager.get(guild_id).ok_or(DiscordError::NotConnected)?;

        if !self.is_playing(guild_id).await {
            return Err(DiscordError::NothingPlaying);
        }

        call.lock().await.stop();
        self.tracks.remove(&guild_id);
        Ok(())
    }

    /// Stop playback and leave the channel.
    pub async fn leave(&self, ctx: &Context, guild_id: GuildId) -> Result<()> {
        let manager = Self::manager(ctx).await?;
        let call = manager.get(guild_id).ok_or(DiscordError::NotConnected)?;

        call.lock().await.stop();
        manager.remove(guild_id).await?;
        self.forget(guild_id);
        info!("Left voice in guild {}", guild_id);
        Ok(())
    }

    /// Drop the bookkeeping for a guild whose call ended.
    pub fn forget(&self, guild_id: GuildId) {
        self.tracks.remove(&guild_id);
        if let Some((_, watcher)) = self.watchers.remove(&guild_id) {
            watcher.abort();
        }
    }

    /// Leave the channel once nothing has played for [`IDLE_TIMEOUT`].
    ///
    /// Replaces an earlier watcher for the same guild.
    pub fn watch_idle(self: &Arc<Self>, ctx: Context, guild_id: GuildId) {
        let sessions = Arc::clone(self);
        let watcher = tokio::spawn(async move {
            let mut clock = IdleClock::new(IDLE_TIMEOUT);
            let mut interval = tokio::time::interval(IDLE_POLL);
            loop {
                interval.tick().await;
                if !Self::is_connected(&ctx, guild_id).await {
                    break;
                }
                let playing = sessions.is_playing(guild_id).await;
                if clock.observe(playing, Instant::now()) {
                    info!("Leaving idle voice channel in guild {}", guild_id);
                    sessions.tracks.remove(&guild_id);
                    if let Ok(manager) = Self::manager(&ctx).await {
                        if let Err(e) = manager.remove(guild_id).await {
                            warn!("Failed to leave idle channel: {}", e);
                        }
                    }
                    break;
                }
            }
        });

        if let Some(previous) = self.watchers.insert(guild_id, watcher) {
            previous.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn idle_clock_resets_on_playback() {
        let start = Instant::now();
        let mut clock = IdleClock::new(Duration::from_secs(180));

        assert!(!clock.observe(false, start));
        assert!(!clock.observe(false, start + Duration::from_secs(179)));
        assert!(!clock.observe(true, start + Duration::from_secs(200)));
        assert!(!clock.observe(false, start + Duration::from_secs(210)));
        assert!(clock.observe(false, start + Duration::from_secs(390)));
    }

    #[test]
    fn channel_limits() {
        assert!(!is_channel_full(None, 50, false));
        assert!(!is_channel_full(Some(0), 50, false));
        assert!(!is_channel_full(Some(3), 2, false));
        assert!(is_channel_full(Some(3), 3, false));
        assert!(!is_channel_full(Some(3), 3, true));
    }
}
