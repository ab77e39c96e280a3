//! Data models flowing through one extraction run and one training run.
//!
//! - [`ExtractedRecord`]: the raw field set pulled out of one candidate container
//! - [`Label`] / [`Verdict`]: the classifier's binary output for one title
//! - [`FinalDecision`]: the accept/reject outcome from the decision engine
//! - [`CuratedRecord`]: one row of the curated output table
//! - [`TrainingExample`]: one labelled corpus row
//! - [`HarvestedRow`]: one unlabelled row produced for building a corpus
//!
//! Output rows serialize with PascalCase field names (`Title`, `WordsCount`, …)
//! because downstream storage consumes those names.

use serde::{Deserialize, Serialize};

/// Fields extracted from a single candidate container.
///
/// Produced exactly once per container. Any field may be `None`; `Title` and
/// `Link` are the ones a record needs to survive curation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExtractedRecord {
    pub title: Option<String>,
    pub kicker: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
}

/// Binary label predicted by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    News,
    NotNews,
}

impl Label {
    /// Map a corpus `IsNews` value (0 or 1) to a label.
    pub fn from_is_news(value: u8) -> Option<Self> {
        match value {
            1 => Some(Label::News),
            0 => Some(Label::NotNews),
            _ => None,
        }
    }

    /// The corpus `IsNews` value for this label.
    pub fn is_news(self) -> u8 {
        match self {
            Label::News => 1,
            Label::NotNews => 0,
        }
    }
}

/// The classifier's verdict for one title.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: Label,
    /// Probability of [`Label::News`] as estimated by the model.
    pub probability: f32,
}

impl Verdict {
    pub fn is_news(&self) -> bool {
        self.label == Label::News
    }
}

/// Which signal, if any, accepted a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptedBy {
    Model,
    Heuristic,
    Both,
}

/// Outcome of the decision engine for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalDecision {
    pub accepted: bool,
    /// `None` when the candidate was rejected.
    pub accepted_by: Option<AcceptedBy>,
}

/// One row of the curated output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CuratedRecord {
    pub title: String,
    pub kicker: Option<String>,
    pub image: Option<String>,
    pub link: String,
    pub words_count: usize,
    pub char_count: usize,
    pub capitalized_words: Vec<String>,
}

/// One labelled row of the training corpus.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrainingExample {
    pub title: String,
    pub label: Label,
}

/// One unlabelled candidate harvested from a page for hand labelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HarvestedRow {
    pub title: String,
    pub kicker: Option<String>,
    pub link: String,
    #[serde(rename = "Img")]
    pub image: Option<String>,
    pub is_news: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curated_record_serializes_with_output_schema_names() {
        let record = CuratedRecord {
            title: "Local Team Wins".to_string(),
            kicker: Some("Sports".to_string()),
            image: None,
            link: "https://site.com/news/1".to_string(),
            words_count: 3,
            char_count: 13,
            capitalized_words: vec!["Local".into(), "Team".into(), "Wins".into()],
        };

        let json = serde_json::to_value(&record).unwrap();
        for key in [
            "Title",
            "Kicker",
            "Image",
            "Link",
            "WordsCount",
            "CharCount",
            "CapitalizedWords",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json["WordsCount"], 3);
        assert!(json["Image"].is_null());
    }

    #[test]
    fn test_label_is_news_mapping() {
        assert_eq!(Label::from_is_news(1), Some(Label::News));
        assert_eq!(Label::from_is_news(0), Some(Label::NotNews));
        assert_eq!(Label::from_is_news(2), None);
        assert_eq!(Label::News.is_news(), 1);
        assert_eq!(Label::NotNews.is_news(), 0);
    }

    #[test]
    fn test_extracted_record_default_is_all_none() {
        let record = ExtractedRecord::default();
        assert!(record.title.is_none());
        assert!(record.kicker.is_none());
        assert!(record.image.is_none());
        assert!(record.link.is_none());
    }
}
