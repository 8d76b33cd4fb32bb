//! Sound catalog commands: listing, trying the resolver, syncing the folder.

use gustel_core::{ResolveRequest, SoundFile, resolve};
use gustel_db::queries::{self, FileQuery};
use gustel_db::SqlitePool;
use gustel_discord::SoundLibrary;
use miette::Result;
use owo_colors::OwoColorize;

use crate::output::Output;

/// Files a guild could play, or every live file when no guild is given.
fn catalog_query(guild: Option<u64>) -> FileQuery {
    match guild {
        Some(guild_id) => FileQuery::playable_in(guild_id),
        None => FileQuery {
            deleted: Some(false),
            ..FileQuery::default()
        },
    }
}

/// One-line summary: `#id name (12s) [tag, tag] private`.
pub fn describe_sound(file: &SoundFile) -> String {
    let mut line = format!("#{} {}", file.id, file.display_name);
    if file.duration_seconds > 0 {
        line.push_str(&format!(" ({}s)", file.duration_seconds));
    }
    if !file.tags.is_empty() {
        let tags: Vec<&str> = file.tags.iter().map(String::as_str).collect();
        line.push_str(&format!(" [{}]", tags.join(", ")));
    }
    if !file.public {
        line.push_str(" private");
    }
    line
}

pub async fn list(pool: &SqlitePool, guild: Option<u64>, output: &Output) -> Result<()> {
    let files = queries::find_files(pool, &catalog_query(guild)).await?;
    if files.is_empty() {
        output.status("No sounds found");
        return Ok(());
    }

    output.status(&format!("{} sounds", files.len()));
    for file in &files {
        output.list_item(&describe_sound(file));
    }
    Ok(())
}

/// Run the resolver against the catalog the way `/play` would.
pub async fn resolve_sound(
    pool: &SqlitePool,
    query: Option<&str>,
    guild: Option<u64>,
    max_duration: Option<i64>,
    tags: &[String],
    output: &Output,
) -> Result<()> {
    let files = queries::find_files(pool, &catalog_query(guild)).await?;

    let mut request = ResolveRequest::new().tags(tags);
    if let Some(guild_id) = guild {
        request = request.guild(guild_id);
    }
    if let Some(seconds) = max_duration {
        request = request.max_duration(seconds);
    }
    if let Some(text) = query {
        request = request.search(text);
    }

    match resolve(&files, &request)? {
        Some(file) => output.success(&describe_sound(file).bright_cyan().to_string()),
        None => output.warning("No sound found"),
    }
    Ok(())
}

/// Reconcile the catalog with the files on disk.
pub async fn sync(pool: &SqlitePool, library: &SoundLibrary, output: &Output) -> Result<()> {
    output.status(&format!("Syncing {}", library.custom_dir().display()));
    let report = library.sync(pool).await?;

    output.info("Marked deleted:", &report.marked_deleted.to_string());
    output.info("Restored:", &report.restored.to_string());
    output.info("Imported:", &report.imported.to_string());
    output.info("Skipped:", &report.skipped.to_string());
    Ok(())
}
