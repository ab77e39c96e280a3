//! Candidate container discovery.
//!
//! Walks the whole document once, in document order, and yields every element
//! that satisfies one of the configured scanner rules. Overlapping matches are
//! kept; deduplication happens at curation time.

use super::RuleSet;
use crate::config::ScannerConfig;
use crate::error::ConfigError;
use scraper::{ElementRef, Html};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Why a matched container was skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanIssue {
    #[error("container matched by rule '{rule}' has no child elements")]
    EmptyContainer { rule: String },
}

/// Finds candidate article containers in a parsed document.
#[derive(Debug, Clone)]
pub struct DocumentScanner {
    rules: RuleSet,
}

impl DocumentScanner {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] when a scanner rule does not compile.
    pub fn from_config(config: &ScannerConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(RuleSet::compile(&config.rules)?))
    }

    /// All candidate containers in `document`, in document order.
    ///
    /// Containers with an unexpected shape are logged and skipped.
    #[instrument(level = "info", skip_all, fields(rules = self.rules.len()))]
    pub fn scan<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        let mut candidates = Vec::new();
        let mut skipped = 0usize;

        let root = document.root_element();
        for element in root.descendants().filter_map(ElementRef::wrap) {
            let Some(rule) = self.rules.first_match(&element) else {
                continue;
            };
            match inspect(element, rule.name()) {
                Ok(()) => candidates.push(element),
                Err(issue) => {
                    skipped += 1;
                    warn!(%issue, "Skipping candidate container");
                }
            }
        }

        info!(count = candidates.len(), skipped, "Scanned document for candidates");
        debug!(rules = self.rules.len(), "Scanner rules applied");
        candidates
    }
}

fn inspect(container: ElementRef<'_>, rule: &str) -> Result<(), ScanIssue> {
    if container.children().any(|child| child.value().is_element()) {
        Ok(())
    } else {
        Err(ScanIssue::EmptyContainer {
            rule: rule.to_string(),
        })
    }
}
