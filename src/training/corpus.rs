//! Reading and writing `;`-delimited corpus files.
//!
//! Fields may be double-quoted (with `""` as an escaped quote), which is how
//! titles containing `;` or line breaks are stored.

use crate::error::TrainingError;
use crate::models::{HarvestedRow, Label, TrainingExample};
use itertools::Itertools;
use std::path::Path;
use tracing::{info, instrument, warn};

const DELIMITER: char = ';';

/// Load labelled examples from a corpus file.
///
/// # Errors
///
/// Returns [`TrainingError`] when the file cannot be read, lacks a `Title` or
/// `IsNews` column, or has no usable rows.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_corpus(path: &Path) -> Result<Vec<TrainingExample>, TrainingError> {
    let raw = std::fs::read_to_string(path).map_err(|source| TrainingError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_corpus(&raw)
}

/// Parse labelled examples from corpus text.
///
/// Rows with an empty title or an `IsNews` other than 0/1 are dropped, then
/// exact duplicates are dropped keeping the first.
///
/// # Errors
///
/// Returns [`TrainingError::MissingColumn`] or [`TrainingError::EmptyCorpus`].
pub fn parse_corpus(raw: &str) -> Result<Vec<TrainingExample>, TrainingError> {
    let mut records = split_records(raw).into_iter();
    let header = records.next().ok_or(TrainingError::MissingColumn("Title"))?;
    let column = |name: &'static str| {
        header
            .iter()
            .position(|h| h.trim().trim_start_matches('\u{feff}') == name)
            .ok_or(TrainingError::MissingColumn(name))
    };
    let title_idx = column("Title")?;
    let label_idx = column("IsNews")?;

    let mut dropped = 0usize;
    let examples = records
        .filter_map(|fields| {
            let title = fields.get(title_idx).map(|t| t.trim()).unwrap_or_default();
            let label = fields.get(label_idx).and_then(|v| parse_label(v));
            match (title.is_empty(), label) {
                (false, Some(label)) => Some(TrainingExample {
                    title: title.to_string(),
                    label,
                }),
                _ => {
                    dropped += 1;
                    None
                }
            }
        })
        .unique()
        .collect::<Vec<_>>();

    if dropped > 0 {
        warn!(dropped, "Dropped corpus rows with empty title or invalid label");
    }
    if examples.is_empty() {
        return Err(TrainingError::EmptyCorpus);
    }
    info!(rows = examples.len(), "Loaded training corpus");
    Ok(examples)
}

/// `0`/`1`, also accepting float spellings such as `1.0`.
fn parse_label(raw: &str) -> Option<Label> {
    let value: f64 = raw.trim().parse().ok()?;
    if value == 0.0 || value == 1.0 {
        Label::from_is_news(value as u8)
    } else {
        None
    }
}

/// Split text into records of fields, honouring quotes. Blank lines are skipped.
fn split_records(raw: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == DELIMITER && !in_quotes => fields.push(std::mem::take(&mut field)),
            '\r' if !in_quotes => {}
            '\n' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
                if !(fields.len() == 1 && fields[0].trim().is_empty()) {
                    records.push(std::mem::take(&mut fields));
                }
                fields.clear();
            }
            c => field.push(c),
        }
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(fields);
    }
    records
}

fn quote(field: &str) -> String {
    if field.contains([DELIMITER, '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render harvested rows as a corpus file ready for labelling.
pub fn render_harvest(rows: &[HarvestedRow]) -> String {
    let mut out = String::from("Title;Kicker;Link;Img;IsNews\n");
    for row in rows {
        let line = [
            quote(&row.title),
            quote(row.kicker.as_deref().unwrap_or_default()),
            quote(&row.link),
            quote(row.image.as_deref().unwrap_or_default()),
            row.is_news.to_string(),
        ]
        .join(";");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_corpus_basic() {
        let raw = "Title;Kicker;IsNews\nCasino opens;Gaming;1\nBuy now;;0\n";
        let examples = parse_corpus(raw).unwrap();
        assert_eq!(
            examples,
            vec![
                TrainingExample {
                    title: "Casino opens".into(),
                    label: Label::News
                },
                TrainingExample {
                    title: "Buy now".into(),
                    label: Label::NotNews
                },
            ]
        );
    }

    #[test]
    fn test_parse_corpus_drops_na_and_duplicates() {
        let raw = "IsNews;Title\r\n1;Casino opens\r\n1;Casino opens\r\n;Missing label\r\n0;\r\nx;Bad label\r\n1.0;Float label\r\n\r\n";
        let examples = parse_corpus(raw).unwrap();
        let titles = examples.iter().map(|e| e.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["Casino opens", "Float label"]);
    }

    #[test]
    fn test_parse_corpus_quoted_fields() {
        let raw = "Title;IsNews\n\"Bets; odds and \"\"tips\"\"\";1\n\"Two\nlines\";0\n";
        let examples = parse_corpus(raw).unwrap();
        assert_eq!(examples[0].title, "Bets; odds and \"tips\"");
        assert_eq!(examples[1].title, "Two\nlines");
    }

    #[test]
    fn test_parse_corpus_missing_columns() {
        assert!(matches!(
            parse_corpus("Headline;IsNews\nx;1\n"),
            Err(TrainingError::MissingColumn("Title"))
        ));
        assert!(matches!(
            parse_corpus("Title;Label\nx;1\n"),
            Err(TrainingError::MissingColumn("IsNews"))
        ));
        assert!(matches!(parse_corpus(""), Err(TrainingError::MissingColumn("Title"))));
    }

    #[test]
    fn test_parse_corpus_empty_after_drop() {
        assert!(matches!(
            parse_corpus("Title;IsNews\n;1\nx;7\n"),
            Err(TrainingError::EmptyCorpus)
        ));
    }

    #[test]
    fn test_render_harvest_can_be_read_back() {
        let rows = vec![HarvestedRow {
            title: "Odds; \"tips\"".into(),
            kicker: None,
            link: "https://site.com/news/1".into(),
            image: Some("https://cdn.site.com/1.jpg".into()),
            is_news: 0,
        }];
        let rendered = render_harvest(&rows);
        assert!(rendered.starts_with("Title;Kicker;Link;Img;IsNews\n"));
        let examples = parse_corpus(&rendered).unwrap();
        assert_eq!(examples[0].title, "Odds; \"tips\"");
        assert_eq!(examples[0].label, Label::NotNews);
    }
}
