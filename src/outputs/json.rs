//! JSON output of curated records.
//!
//! Files are grouped by date, one file per run, named down to the
//! millisecond. An existing file is never overwritten.
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── 081502-042.json
//!     └── 161030-907.json
//! ```

use crate::models::CuratedRecord;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::error::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, instrument};

/// Summary printed after a run, with the first few records as a sample.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub message: &'static str,
    pub time_elapsed: f64,
    pub total: usize,
    pub output_path: &'a str,
    pub sample: &'a [CuratedRecord],
}

impl<'a> RunSummary<'a> {
    pub const SAMPLE_SIZE: usize = 5;

    pub fn new(records: &'a [CuratedRecord], output_path: &'a str, time_elapsed: f64) -> Self {
        Self {
            message: "Scraping completed",
            time_elapsed,
            total: records.len(),
            output_path,
            sample: &records[..records.len().min(Self::SAMPLE_SIZE)],
        }
    }
}

/// Path of the output file for a run started at `at`.
///
/// # Arguments
///
/// * `json_output_dir` - Root output directory; a trailing `/` is ignored
/// * `at` - Start time of the run
///
/// # Returns
///
/// A tuple of `(date_directory, file_path)`.
pub fn output_path(json_output_dir: &str, at: DateTime<Local>) -> (String, String) {
    let dir = format!(
        "{}/{}",
        json_output_dir.trim_end_matches('/'),
        at.format("%Y-%m-%d")
    );
    let file = format!("{}/{}.json", dir, at.format("%H%M%S-%3f"));
    (dir, file)
}

/// Write curated records as a JSON array under a date-based directory.
///
/// # Returns
///
/// The path of the written file.
///
/// # Errors
///
/// Returns an error if serialization, directory creation or the write fails,
/// or if a file for the same millisecond already exists.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_records(
    records: &[CuratedRecord],
    json_output_dir: &str,
) -> Result<String, Box<dyn Error>> {
    write_records_at(records, json_output_dir, Local::now()).await
}

async fn write_records_at(
    records: &[CuratedRecord],
    json_output_dir: &str,
    at: DateTime<Local>,
) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string(records)?;
    let (dir, path) = output_path(json_output_dir, at);

    if let Err(e) = fs::create_dir_all(&dir).await {
        error!(%dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let mut file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
    {
        Ok(file) => file,
        Err(e) => {
            error!(%path, error = %e, "Refusing to write JSON output");
            return Err(e.into());
        }
    };
    file.write_all(json.as_bytes()).await?;
    file.flush().await?;
    info!(%path, count = records.len(), "Wrote curated records");
    Ok(path)
}
