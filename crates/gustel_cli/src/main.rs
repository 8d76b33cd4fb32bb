mod commands;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use gustel_core::{BotConfig, SymphoniaProbe};
use gustel_db::GustelDb;
use gustel_discord::{BotState, GustelBot, SoundLibrary};
use miette::{IntoDiagnostic, Result};
use tracing::info;

use crate::output::Output;

#[derive(Parser, Debug)]
#[command(name = "gustelbot")]
#[command(about = "GustelBot, the soundboard bot for Discord")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Data directory for sounds, logs and the database (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot
    Run,
    /// Sound catalog tools
    Sounds {
        #[command(subcommand)]
        cmd: SoundCommands,
    },
    /// Database inspection
    Db {
        #[command(subcommand)]
        cmd: DbCommands,
    },
}

#[derive(Subcommand, Debug)]
enum SoundCommands {
    /// List sounds, optionally only those a guild can play
    List {
        #[arg(long)]
        guild: Option<u64>,
    },
    /// Show which sound /play would pick
    Resolve {
        /// Search text; omit for a random sound
        query: Option<String>,
        #[arg(long)]
        guild: Option<u64>,
        /// Longest acceptable sound in seconds, 0 for no limit
        #[arg(long)]
        max_duration: Option<i64>,
        /// Required tag, repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Reconcile the catalog with the sound folder
    Sync,
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    /// Connectivity and row counts
    Check,
}

fn init_tracing(cli: &Cli, config: &BotConfig) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_appender::rolling;
    use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = config.storage.logs_dir();
    std::fs::create_dir_all(&log_dir).into_diagnostic()?;

    let file_appender = rolling::daily(&log_dir, "gustelbot.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let level = if cli.debug {
        "debug"
    } else {
        config.log_level.as_filter()
    };
    let directives =
        format!("gustel_core={level},gustel_db={level},gustel_discord={level},gustelbot={level},warn");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let terminal_layer = if cli.debug {
        fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(false)
            .pretty()
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .compact()
            .boxed()
    };

    let file_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_ansi(false)
        .with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(terminal_layer.with_filter(env_filter))
        .with(file_layer.with_filter(EnvFilter::new(&directives)))
        .init();

    info!(
        "Logging initialized. Logs are being written to: {:?}",
        log_dir.join("gustelbot.log")
    );
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    let mut config = BotConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = dir.clone();
    }
    let _guard = init_tracing(&cli, &config)?;

    config.storage.ensure_folders().into_diagnostic()?;
    let db = GustelDb::open(config.database_path()).await?;
    let output = Output::new();

    let result = match &cli.command {
        Commands::Run => {
            config.discord.validate()?;
            let library = SoundLibrary::new(&config.storage, Arc::new(SymphoniaProbe));
            let state = BotState::new(config.clone(), db.clone(), library);
            info!("Starting bot...");
            GustelBot::new(state).run().await.map_err(Into::into)
        }
        Commands::Sounds { cmd } => match cmd {
            SoundCommands::List { guild } => commands::sounds::list(db.pool(), *guild, &output).await,
            SoundCommands::Resolve {
                query,
                guild,
                max_duration,
                tags,
            } => {
                commands::sounds::resolve_sound(
                    db.pool(),
                    query.as_deref(),
                    *guild,
                    *max_duration,
                    tags,
                    &output,
                )
                .await
            }
            SoundCommands::Sync => {
                let library = SoundLibrary::new(&config.storage, Arc::new(SymphoniaProbe));
                commands::sounds::sync(db.pool(), &library, &output).await
            }
        },
        Commands::Db { cmd } => match cmd {
            DbCommands::Check => commands::db::check(&db, &output).await,
        },
    };

    db.close().await;
    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gustelbot", "db", "check", "--debug", "--data-dir", "/tmp/g"])
            .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/g")));
        assert!(matches!(cli.command, Commands::Db { cmd: DbCommands::Check }));
    }

    #[test]
    fn resolve_takes_repeated_tags() {
        let cli = Cli::try_parse_from([
            "gustelbot",
            "sounds",
            "resolve",
            "airhorn",
            "--guild",
            "42",
            "--max-duration",
            "30",
            "--tag",
            "meme",
            "--tag",
            "laut",
        ])
        .unwrap();

        let Commands::Sounds {
            cmd:
                SoundCommands::Resolve {
                    query,
                    guild,
                    max_duration,
                    tags,
                },
        } = cli.command
        else {
            panic!("expected sounds resolve");
        };
        assert_eq!(query.as_deref(), Some("airhorn"));
        assert_eq!(guild, Some(42));
        assert_eq!(max_duration, Some(30));
        assert_eq!(tags, vec!["meme".to_string(), "laut".to_string()]);
    }

    #[test]
    fn random_resolve_needs_no_query() {
        let cli = Cli::try_parse_from(["gustelbot", "sounds", "resolve"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sounds {
                cmd: SoundCommands::Resolve { query: None, .. }
            }
        ));
    }
}
