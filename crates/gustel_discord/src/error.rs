use gustel_core::{ProbeError, ResolveError, UploadError};
use gustel_db::DbError;
use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscordError>;

#[derive(Error, Diagnostic, Debug)]
pub enum DiscordError {
    #[error("Discord API error")]
    #[diagnostic(code(gustel_discord::api_error))]
    Api(#[from] serenity::Error),

    #[error("Database error")]
    #[diagnostic(code(gustel_discord::database))]
    Database(#[from] DbError),

    #[error("This command only works in a server")]
    #[diagnostic(code(gustel_discord::guild_only))]
    GuildOnly,

    #[error("You are not in a voice channel!")]
    #[diagnostic(code(gustel_discord::not_in_voice))]
    NotInVoice,

    #[error("Channel is already full!")]
    #[diagnostic(code(gustel_discord::channel_full))]
    ChannelFull,

    #[error("I am not connected to any channel.")]
    #[diagnostic(code(gustel_discord::not_connected))]
    NotConnected,

    #[error("There is nothing to stop")]
    #[diagnostic(code(gustel_discord::nothing_playing))]
    NothingPlaying,

    #[error("Failed to join your channel")]
    #[diagnostic(
        code(gustel_discord::voice_join),
        help("Check that the bot may connect and speak in that channel")
    )]
    VoiceJoin(#[from] songbird::error::JoinError),

    #[error("Voice client is not initialised")]
    #[diagnostic(
        code(gustel_discord::voice_missing),
        help("songbird must be registered on the client builder")
    )]
    VoiceUnavailable,

    #[error("You are not allowed to change server settings.")]
    #[diagnostic(code(gustel_discord::permission_denied))]
    PermissionDenied,

    #[error("Missing option `{0}`")]
    #[diagnostic(code(gustel_discord::missing_option))]
    MissingOption(&'static str),

    #[error("Unknown command: {0}")]
    #[diagnostic(code(gustel_discord::unknown_command))]
    UnknownCommand(String),

    #[error("Failed to upload file: {0}")]
    #[diagnostic(code(gustel_discord::upload))]
    Upload(#[from] UploadError),

    #[error("Failed to upload file: not a valid audio file")]
    #[diagnostic(code(gustel_discord::not_audio))]
    NotAudio(#[source] ProbeError),

    #[error("Invalid request: {0}")]
    #[diagnostic(code(gustel_discord::invalid_request))]
    Resolve(#[from] ResolveError),

    #[error("File system error")]
    #[diagnostic(code(gustel_discord::io))]
    Io(#[from] std::io::Error),
}

impl DiscordError {
    /// Text shown to the user who ran the command.
    ///
    /// Errors the user can act on are shown verbatim, everything else is
    /// logged and answered with a generic message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(_) | Self::Database(_) | Self::VoiceUnavailable | Self::Io(_) => {
                "Internal server error.".to_string()
            }
            Self::VoiceJoin(_) => "Failed to join your channel.".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the failure is the bot's fault rather than the user's.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Api(_)
                | Self::Database(_)
                | Self::VoiceUnavailable
                | Self::VoiceJoin(_)
                | Self::Io(_)
                | Self::UnknownCommand(_)
                | Self::MissingOption(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_stay_generic() {
        let err = DiscordError::Database(DbError::invalid_data("broken row"));
        assert_eq!(err.user_message(), "Internal server error.");
        assert!(err.is_internal());
    }

    #[test]
    fn user_errors_are_shown() {
        assert_eq!(
            DiscordError::ChannelFull.user_message(),
            "Channel is already full!"
        );
        assert_eq!(
            DiscordError::Upload(UploadError::EmptyName).user_message(),
            format!("Failed to upload file: {}", UploadError::EmptyName)
        );
        assert!(!DiscordError::NotInVoice.is_internal());
    }
}
