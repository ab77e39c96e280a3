//! # Headline Sieve CLI
//!
//! Driver around the library: classifies a rendered page, trains the model
//! pair, or harvests candidates for labelling.
//!
//! ## Usage
//!
//! ```sh
//! headline_sieve run --html page.html -j ./json
//! headline_sieve train --corpus csv/categorized_news.csv
//! headline_sieve harvest --html page.html -o csv/raw_elements.csv
//! ```

use clap::Parser;
use headline_sieve::outputs::{corpus, json};
use headline_sieve::scrapers::harvest::harvest;
use headline_sieve::utils::ensure_writable_dir;
use headline_sieve::{Config, ModelArtifacts, Pipeline, train_from_file};
use scraper::Html;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("headline_sieve starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(model_dir) = args.model_dir {
        config.model_dir = model_dir;
    }

    let result = match args.command {
        Command::Run { html, output_dir } => run(&config, &html, &output_dir, start_time).await,
        Command::Train { corpus } => run_training(config, corpus).await,
        Command::Harvest { html, output } => run_harvest(&html, &output).await,
    };

    if let Err(e) = &result {
        error!(error = %e, "headline_sieve failed");
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), millis = elapsed.subsec_millis(), "Execution complete");
    result
}

async fn run(
    config: &Config,
    html_path: &Path,
    output_dir: &str,
    start_time: std::time::Instant,
) -> Result<(), Box<dyn Error>> {
    // Early check: ensure JSON output dir is writable
    ensure_writable_dir(output_dir).await?;

    // The model must load before any extraction starts
    let model = ModelArtifacts::load(&config.model_dir)?;
    info!(
        model_dir = %config.model_dir.display(),
        vocabulary = model.vectorizer().dim(),
        "Loaded model artifacts"
    );
    let pipeline = Pipeline::new(config, Arc::new(model))?;

    let html = tokio::fs::read_to_string(html_path).await?;
    let records = pipeline.run(&Html::parse_document(&html));
    info!(count = records.len(), "Curated records");

    let path = json::write_records(&records, output_dir).await?;
    let summary = json::RunSummary::new(&records, &path, start_time.elapsed().as_secs_f64());
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn run_training(config: Config, corpus_path: std::path::PathBuf) -> Result<(), Box<dyn Error>> {
    let model_dir = config.model_dir.clone();
    let report = tokio::task::spawn_blocking(move || {
        train_from_file(&corpus_path, &config.training, &config.model_dir)
    })
    .await??;

    info!(
        model_dir = %model_dir.display(),
        train_rows = report.train_rows,
        test_rows = report.test_rows,
        "Model artifacts saved"
    );
    println!("Held-out accuracy: {:.2}", report.accuracy);
    Ok(())
}

async fn run_harvest(html_path: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let html = tokio::fs::read_to_string(html_path).await?;
    let rows = harvest(&Html::parse_document(&html));
    corpus::write_harvest(&rows, output).await?;
    println!("Harvested {} candidates into {}", rows.len(), output.display());
    Ok(())
}
