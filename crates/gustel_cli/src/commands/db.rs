//! Database inspection

use gustel_db::GustelDb;
use miette::Result;

use crate::output::Output;

/// Check the connection and print row counts.
pub async fn check(db: &GustelDb, output: &Output) -> Result<()> {
    db.health_check().await?;
    output.success("Database reachable");

    let stats = db.stats().await?;
    output.info("Servers:", &stats.server_count.to_string());
    output.info("Users:", &stats.user_count.to_string());
    output.info("Sound files:", &stats.file_count.to_string());
    output.info("Tags:", &stats.tag_count.to_string());
    output.info("Brotato runs:", &stats.brotato_run_count.to_string());
    Ok(())
}
