//! Writing harvested candidates to disk for hand labelling.

use crate::models::HarvestedRow;
use crate::training::corpus::render_harvest;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Write `rows` as a `;`-delimited corpus file, creating parent directories.
///
/// # Arguments
///
/// * `rows` - Harvested candidates, all labelled `IsNews = 0`
/// * `path` - Destination file; replaced if it exists
///
/// # Errors
///
/// Returns an error if a directory cannot be created or the write fails.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_harvest(rows: &[HarvestedRow], path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, render_harvest(rows)).await?;
    info!(count = rows.len(), "Wrote harvested corpus");
    Ok(())
}
