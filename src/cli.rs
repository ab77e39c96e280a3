//! Command-line interface definitions.
//!
//! Global options can also be given through environment variables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for Headline Sieve.
///
/// # Examples
///
/// ```sh
/// # Classify a rendered page with the trained model
/// headline_sieve run --html page.html --output-dir ./json
///
/// # Train from a labelled corpus
/// headline_sieve train --corpus csv/categorized_news.csv
///
/// # Dump generic candidates for labelling
/// headline_sieve harvest --html page.html --output csv/raw_elements.csv
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long, global = true, env = "HEADLINE_SIEVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the model artifacts (overrides the config file)
    #[arg(long, global = true, env = "HEADLINE_SIEVE_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract and classify news items from a rendered page
    Run {
        /// Rendered HTML of the page
        #[arg(long)]
        html: PathBuf,

        /// Output directory for the JSON records
        #[arg(short = 'j', long)]
        output_dir: String,
    },

    /// Fit and persist the vectorizer and classifier
    Train {
        /// `;`-delimited corpus with `Title` and `IsNews` columns
        #[arg(long)]
        corpus: PathBuf,
    },

    /// Collect unlabelled candidates from a page into a corpus file
    Harvest {
        /// Rendered HTML of the page
        #[arg(long)]
        html: PathBuf,

        /// Corpus file to write
        #[arg(short, long)]
        output: PathBuf,
    },
}
