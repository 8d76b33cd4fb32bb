//! Bot configuration.
//!
//! `BotConfig` is built once at process start from defaults, an optional TOML
//! file and environment overrides, then handed to every component that needs
//! it. Nothing reads the environment after [`BotConfig::load`] returns.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;

pub const ENV_DISCORD_TOKEN: &str = "DISCORD_TOKEN";
pub const ENV_DEBUG_GUILDS: &str = "DISCORD_DEBUG_GUILDS";
pub const ENV_SUPERUSER: &str = "GUSTELBOT_SUPERUSER";
pub const ENV_LOG_LEVEL: &str = "GUSTELBOT_LOGLEVEL";
pub const ENV_DATA_DIR: &str = "GUSTELBOT_DATA_DIR";
pub const ENV_DATABASE: &str = "GUSTELBOT_DATABASE";

/// Complete bot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub discord: DiscordConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub log_level: LogLevel,
}

impl BotConfig {
    /// Load configuration from `path`, or from the standard location if it
    /// exists, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                info!("Loading config from: {}", path.display());
                Self::from_file(path)?
            }
            None => match Self::standard_location().filter(|p| p.exists()) {
                Some(path) => {
                    info!("Loading config from: {}", path.display());
                    Self::from_file(&path)?
                }
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// `<config dir>/gustelbot/config.toml`
    pub fn standard_location() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gustelbot").join("config.toml"))
    }

    /// Apply overrides from an environment-like lookup.
    ///
    /// Unset keys keep the current value.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(ENV_DISCORD_TOKEN) {
            Some(token) => self.discord.token = token,
            None if self.discord.token.is_empty() => {
                warn!("Variable {ENV_DISCORD_TOKEN} not provided and no token configured")
            }
            None => {}
        }

        if let Some(raw) = lookup(ENV_DEBUG_GUILDS) {
            self.discord.debug_guilds = parse_id_list(ENV_DEBUG_GUILDS, &raw)?;
        }

        if let Some(raw) = lookup(ENV_SUPERUSER).filter(|s| !s.trim().is_empty()) {
            self.discord.superuser = Some(parse_id(ENV_SUPERUSER, &raw)?);
        }

        match lookup(ENV_LOG_LEVEL) {
            Some(raw) => self.log_level = LogLevel::parse_lossy(&raw),
            None => debug!(
                "Variable {ENV_LOG_LEVEL} not provided, keeping {}",
                self.log_level.as_str()
            ),
        }

        match lookup(ENV_DATA_DIR) {
            Some(dir) => self.storage.data_dir = PathBuf::from(dir),
            None => debug!(
                "Variable {ENV_DATA_DIR} not provided, keeping {}",
                self.storage.data_dir.display()
            ),
        }

        if let Some(path) = lookup(ENV_DATABASE) {
            self.database.path = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Database file, defaulting to `<data dir>/gustelbot.db`.
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| self.storage.data_dir.join("gustelbot.db"))
    }
}

/// Discord credentials and access settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token
    pub token: String,
    /// Guilds that get commands registered directly (instant updates while developing).
    /// Empty registers commands globally.
    pub debug_guilds: Vec<u64>,
    /// User allowed to change every server's settings
    pub superuser: Option<u64>,
}

impl DiscordConfig {
    /// Ensure the bot can log in.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingField("discord.token"));
        }
        Ok(())
    }

    pub fn is_superuser(&self, user_id: u64) -> bool {
        self.superuser == Some(user_id)
    }
}

/// Database location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; `None` puts it in the data directory
    pub path: Option<PathBuf>,
}

/// On-disk layout for sounds and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("gustelbot"),
        }
    }
}

impl StorageConfig {
    pub fn sounds_dir(&self) -> PathBuf {
        self.data_dir.join("sounds")
    }

    /// Bundled clips (conch answers). Not reachable from `/play`.
    pub fn default_sounds_dir(&self) -> PathBuf {
        self.sounds_dir().join("default")
    }

    /// Uploaded sounds.
    pub fn custom_sounds_dir(&self) -> PathBuf {
        self.sounds_dir().join("custom")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// Create every folder the bot writes to. Safe to call repeatedly.
    pub fn ensure_folders(&self) -> std::io::Result<()> {
        for folder in [
            self.data_dir.clone(),
            self.sounds_dir(),
            self.default_sounds_dir(),
            self.custom_sounds_dir(),
        ] {
            if !folder.exists() {
                debug!("Creating folder {}", folder.display());
                std::fs::create_dir_all(&folder)?;
            }
        }
        Ok(())
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Parse a level name, falling back to `Info` for anything unknown.
    pub fn parse_lossy(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "debug" => Self::Debug,
            "warning" | "warn" => Self::Warning,
            "error" => Self::Error,
            "critical" => Self::Critical,
            _ => Self::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}

fn parse_id(field: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|e| ConfigError::InvalidValue {
            field,
            reason: format!("'{raw}' is not a Discord id: {e}"),
        })
}

/// Parse a comma-separated id list, skipping empty entries.
fn parse_id_list(field: &'static str, raw: &str) -> Result<Vec<u64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_id(field, part))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_defaults() {
        let mut config = BotConfig::default();
        config
            .apply_env_with(env(&[
                (ENV_DISCORD_TOKEN, "secret"),
                (ENV_DEBUG_GUILDS, "1, 2,,3"),
                (ENV_SUPERUSER, "42"),
                (ENV_LOG_LEVEL, "DEBUG"),
                (ENV_DATA_DIR, "/srv/gustel"),
            ]))
            .unwrap();

        assert_eq!(config.discord.token, "secret");
        assert_eq!(config.discord.debug_guilds, vec![1, 2, 3]);
        assert!(config.discord.is_superuser(42));
        assert!(!config.discord.is_superuser(43));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.database_path(), PathBuf::from("/srv/gustel/gustelbot.db"));
    }

    #[test]
    fn unset_env_keeps_file_values() {
        let mut config: BotConfig = toml::from_str(
            r#"
            log_level = "warning"

            [discord]
            token = "from-file"
            debug_guilds = [7]

            [database]
            path = "/tmp/other.db"
            "#,
        )
        .unwrap();
        config.apply_env_with(env(&[])).unwrap();

        assert_eq!(config.discord.token, "from-file");
        assert_eq!(config.discord.debug_guilds, vec![7]);
        assert_eq!(config.log_level, LogLevel::Warning);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/other.db"));
    }

    #[test]
    fn bad_ids_are_rejected() {
        let mut config = BotConfig::default();
        let err = config
            .apply_env_with(env(&[(ENV_DEBUG_GUILDS, "12,abc")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: ENV_DEBUG_GUILDS, .. }
        ));
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        assert_eq!(LogLevel::parse_lossy("verbose"), LogLevel::Info);
        assert_eq!(LogLevel::parse_lossy(" Warn "), LogLevel::Warning);
        assert_eq!(LogLevel::Critical.as_filter(), "error");
    }

    #[test]
    fn missing_token_fails_validation() {
        assert!(matches!(
            DiscordConfig::default().validate(),
            Err(ConfigError::MissingField("discord.token"))
        ));
    }

    #[test]
    fn ensure_folders_creates_layout() {
        let temp = tempfile::TempDir::new().unwrap();
        let storage = StorageConfig {
            data_dir: temp.path().join("data"),
        };

        storage.ensure_folders().unwrap();
        storage.ensure_folders().unwrap();

        assert!(storage.default_sounds_dir().is_dir());
        assert!(storage.custom_sounds_dir().is_dir());
    }
}
