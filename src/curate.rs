//! Post-processing of decided candidates into the curated output table.
//!
//! Order of operations, all in traversal order:
//! 1. drop records without a Title (regardless of the decision)
//! 2. drop rejected records and records without a Link
//! 3. keep the first record for each raw Title, discard later duplicates
//! 4. derive `WordsCount`, `CharCount` and `CapitalizedWords`

use crate::models::{CuratedRecord, ExtractedRecord, FinalDecision};
use crate::utils::{is_title_case, truncate_for_log};
use itertools::Itertools;
use tracing::{debug, info};

/// Build the curated table from decided records.
///
/// # Arguments
///
/// * `decided` - Extracted records paired with their decision, in traversal order
///
/// # Returns
///
/// One [`CuratedRecord`] per distinct accepted title that also has a link,
/// in first-seen order.
pub fn curate<I>(decided: I) -> Vec<CuratedRecord>
where
    I: IntoIterator<Item = (ExtractedRecord, FinalDecision)>,
{
    let mut seen = 0usize;
    let curated = decided
        .into_iter()
        .inspect(|_| seen += 1)
        .filter_map(|(record, decision)| {
            let title = record.title?;
            if !decision.accepted {
                debug!(title = %truncate_for_log(&title, 80), "Dropping rejected candidate");
                return None;
            }
            let link = record.link?;
            Some((title, record.kicker, record.image, link))
        })
        .unique_by(|(title, ..)| title.clone())
        .map(|(title, kicker, image, link)| {
            let metrics = TitleMetrics::of(&title);
            CuratedRecord {
                title,
                kicker,
                image,
                link,
                words_count: metrics.words_count,
                char_count: metrics.char_count,
                capitalized_words: metrics.capitalized_words,
            }
        })
        .collect::<Vec<_>>();

    info!(candidates = seen, kept = curated.len(), "Curated records");
    curated
}

/// Derived metrics over a title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMetrics {
    /// Whitespace-delimited tokens.
    pub words_count: usize,
    /// Characters with whitespace removed.
    pub char_count: usize,
    /// Tokens that are title-cased.
    pub capitalized_words: Vec<String>,
}

impl TitleMetrics {
    pub fn of(title: &str) -> Self {
        let words = title.split_whitespace().collect::<Vec<_>>();
        Self {
            words_count: words.len(),
            char_count: title.chars().filter(|c| !c.is_whitespace()).count(),
            capitalized_words: words
                .iter()
                .filter(|w| is_title_case(w))
                .map(|w| w.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AcceptedBy;

    fn accepted() -> FinalDecision {
        FinalDecision {
            accepted: true,
            accepted_by: Some(AcceptedBy::Model),
        }
    }

    fn rejected() -> FinalDecision {
        FinalDecision {
            accepted: false,
            accepted_by: None,
        }
    }

    fn record(title: Option<&str>, link: Option<&str>) -> ExtractedRecord {
        ExtractedRecord {
            title: title.map(str::to_string),
            kicker: Some("Kicker".to_string()),
            image: None,
            link: link.map(str::to_string),
        }
    }

    #[test]
    fn test_duplicate_titles_keep_first() {
        let rows = curate(vec![
            (record(Some("Local Team Wins"), Some("https://a.com/news/1")), accepted()),
            (record(Some("Other Story"), Some("https://a.com/news/2")), accepted()),
            (record(Some("Local Team Wins"), Some("https://b.com/news/9")), accepted()),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "Local Team Wins");
        assert_eq!(rows[0].link, "https://a.com/news/1");
        assert_eq!(rows[1].title, "Other Story");
    }

    #[test]
    fn test_untitled_record_always_dropped() {
        let rows = curate(vec![
            (record(None, Some("https://site.com/news/1")), accepted()),
            (record(None, Some("https://site.com/news/2")), rejected()),
        ]);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_rejected_and_linkless_records_dropped() {
        let rows = curate(vec![
            (record(Some("Rejected"), Some("https://site.com/x")), rejected()),
            (record(Some("No Link"), None), accepted()),
            (record(Some("Kept"), Some("https://site.com/news/3")), accepted()),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Kept");
        assert_eq!(rows[0].kicker.as_deref(), Some("Kicker"));
    }

    #[test]
    fn test_rejected_duplicate_does_not_shadow_accepted_one() {
        let rows = curate(vec![
            (record(Some("Same"), Some("https://site.com/a")), rejected()),
            (record(Some("Same"), Some("https://site.com/news/b")), accepted()),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].link, "https://site.com/news/b");
    }

    #[test]
    fn test_title_metrics() {
        let m = TitleMetrics::of("Quick Brown Fox");
        assert_eq!(m.words_count, 3);
        assert_eq!(m.char_count, 13);
        assert_eq!(m.capitalized_words, vec!["Quick", "Brown", "Fox"]);

        let m = TitleMetrics::of("NASA and the U.S. sign 2025 deal");
        assert_eq!(m.words_count, 7);
        assert_eq!(m.char_count, 26);
        assert_eq!(m.capitalized_words, vec!["U.S."]);
    }

    #[test]
    fn test_metrics_attached_to_output() {
        let rows = curate(vec![(
            record(Some("Quick Brown Fox"), Some("https://site.com/news/1")),
            accepted(),
        )]);
        assert_eq!(rows[0].words_count, 3);
        assert_eq!(rows[0].char_count, 13);
        assert_eq!(rows[0].capitalized_words.len(), 3);
    }
}
