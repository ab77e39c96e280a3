//! The inference pipeline: scan, extract, classify, decide, curate.
//!
//! A [`Pipeline`] is built once with compiled configuration and an already
//! loaded classifier, then reused for any number of documents. Runs are
//! synchronous and never mutate the pipeline, so one instance (and its model)
//! can be shared behind an `Arc` by callers that scrape pages concurrently.

use crate::classify::TitleClassifier;
use crate::config::Config;
use crate::curate::curate;
use crate::decision::DecisionEngine;
use crate::error::ConfigError;
use crate::models::{CuratedRecord, ExtractedRecord, FinalDecision, Label, Verdict};
use crate::scrapers::fields::FieldExtractor;
use crate::scrapers::scanner::DocumentScanner;
use crate::utils::{normalize_text, truncate_for_log};
use scraper::Html;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct Pipeline {
    scanner: DocumentScanner,
    extractor: FieldExtractor,
    engine: DecisionEngine,
    classifier: Arc<dyn TitleClassifier>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("scanner", &self.scanner)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a scanner or field rule does not compile.
    pub fn new(config: &Config, classifier: Arc<dyn TitleClassifier>) -> Result<Self, ConfigError> {
        Ok(Self {
            scanner: DocumentScanner::from_config(&config.scanner)?,
            extractor: FieldExtractor::from_config(&config.fields)?,
            engine: DecisionEngine::new(&config.decision),
            classifier,
        })
    }

    /// Run the whole pipeline over a parsed document.
    ///
    /// Scanning, extraction, classification and decision happen per
    /// container; curation runs once over the full list.
    ///
    /// # Returns
    ///
    /// The curated records in document order.
    #[instrument(level = "info", skip_all)]
    pub fn run(&self, document: &Html) -> Vec<CuratedRecord> {
        let decided = self
            .scanner
            .scan(document)
            .into_iter()
            .map(|container| {
                let record = self.extractor.extract(container);
                let decision = self.decide(&record);
                (record, decision)
            })
            .collect::<Vec<_>>();

        let accepted = decided.iter().filter(|(_, d)| d.accepted).count();
        info!(candidates = decided.len(), accepted, "Classified candidates");
        curate(decided)
    }

    /// Parse `html` and run the pipeline over it.
    pub fn run_html(&self, html: &str) -> Vec<CuratedRecord> {
        self.run(&Html::parse_document(html))
    }

    fn decide(&self, record: &ExtractedRecord) -> FinalDecision {
        let verdict = match &record.title {
            Some(title) => self.classifier.classify(&normalize_text(title)),
            None => Verdict {
                label: Label::NotNews,
                probability: 0.0,
            },
        };
        let decision = self.engine.decide(record, &verdict);
        debug!(
            title = %record.title.as_deref().map(|t| truncate_for_log(t, 80)).unwrap_or_default(),
            label = ?verdict.label,
            probability = verdict.probability,
            accepted = decision.accepted,
            "Decided candidate"
        );
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Says news for an explicit set of normalized titles.
    struct StubClassifier {
        news: HashSet<&'static str>,
    }

    impl TitleClassifier for StubClassifier {
        fn classify(&self, normalized_title: &str) -> Verdict {
            let label = if self.news.contains(normalized_title) {
                Label::News
            } else {
                Label::NotNews
            };
            Verdict {
                label,
                probability: if label == Label::News { 1.0 } else { 0.0 },
            }
        }
    }

    fn pipeline(news: &[&'static str]) -> Pipeline {
        let classifier = StubClassifier {
            news: news.iter().copied().collect(),
        };
        Pipeline::new(&Config::default(), Arc::new(classifier)).unwrap()
    }

    fn slot(n: usize, title: &str, href: &str) -> String {
        format!(
            r#"<div class="slot slot_{n} noticia">
                 <div class="volanta fuente_roboto_slab">Kicker {n}</div>
                 <h2 class="titulo fuente_roboto_slab"><a href="{href}">{title}</a></h2>
               </div>"#
        )
    }

    #[test]
    fn test_run_combines_model_and_heuristic() {
        let html = format!(
            "<html><body>{}{}{}{}</body></html>",
            slot(1, "Breaking: Market Crashes Today", "https://site.com/news/123"),
            slot(2, "Buy Now Discount", "https://shop.com/sale"),
            slot(3, "Subscribe To Our Newsletter", "https://site.com/subscribe"),
            slot(4, "Breaking: Market Crashes Today", "https://site.com/news/999"),
        );
        let rows = pipeline(&["buy now discount"]).run_html(&html);

        let titles = rows.iter().map(|r| r.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["Breaking: Market Crashes Today", "Buy Now Discount"]);
        assert_eq!(rows[0].link, "https://site.com/news/123");
        assert_eq!(rows[0].kicker.as_deref(), Some("Kicker 1"));
        assert_eq!(rows[1].words_count, 3);
    }

    #[test]
    fn test_run_survives_malformed_candidates() {
        let html = format!(
            r#"<html><body>
                 <div class="slot slot_0 noticia"></div>
                 <div class="slot slot_1 noticia"><p>no heading</p></div>
                 {}
               </body></html>"#,
            slot(2, "Local Team Wins", "https://site.com/news/7"),
        );
        let rows = pipeline(&[]).run_html(&html);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Local Team Wins");
    }

    #[test]
    fn test_run_on_page_without_candidates_is_empty() {
        let rows = pipeline(&[]).run_html("<html><body><p>nothing</p></body></html>");
        assert!(rows.is_empty());
    }
}
