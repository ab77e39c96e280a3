//! # Headline Sieve
//!
//! Extracts news-slot candidates from a rendered front page and keeps the ones
//! that are real news items rather than navigation, ads or promo blocks.
//!
//! ## Architecture
//!
//! Inference runs synchronously over a fully parsed document:
//! 1. **Scanning**: find candidate containers by configured class-name rules
//! 2. **Extraction**: pull Title, Kicker, Image and Link from each container
//! 3. **Classification**: TF-IDF features of the normalized title, scored by a
//!    boosted tree ensemble
//! 4. **Decision**: merge the model verdict with a link heuristic
//! 5. **Curation**: drop incomplete rows, dedupe titles, add title metrics
//!
//! Training is a separate offline flow ([`training::train_from_file`]) that
//! fits and persists the two artifacts inference loads at startup.
//!
//! ```no_run
//! use headline_sieve::{Config, ModelArtifacts, Pipeline};
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let model = ModelArtifacts::load(&config.model_dir)?;
//! let pipeline = Pipeline::new(&config, Arc::new(model))?;
//! let rows = pipeline.run_html("<html>...</html>");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod classify;
pub mod config;
pub mod curate;
pub mod decision;
pub mod error;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod scrapers;
pub mod training;
pub mod utils;

pub use classify::{ModelArtifacts, TitleClassifier};
pub use config::Config;
pub use models::{CuratedRecord, ExtractedRecord};
pub use pipeline::Pipeline;
pub use training::{TrainingReport, train, train_from_file};
