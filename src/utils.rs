//! Text helpers shared by extraction, training and curation, plus small
//! filesystem and logging utilities.
//!
//! - [`normalize_text`]: the single normalisation applied to titles both when
//!   fitting the vectorizer and when classifying a candidate
//! - [`is_title_case`]: the "title-cased word" check used for `CapitalizedWords`
//! - [`truncate_for_log`]: keeps long titles and links readable in log lines
//! - [`ensure_writable_dir`]: fail-fast probe for output directories

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

static NON_WORD_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").unwrap());

/// Normalize a piece of text for vectorization.
///
/// Lowercases, replaces every maximal run of non-word characters with one
/// space and trims the result. `normalize_text(normalize_text(t))` is always
/// equal to `normalize_text(t)`.
///
/// # Examples
///
/// ```
/// use headline_sieve::utils::normalize_text;
/// assert_eq!(normalize_text("  Breaking: Market -- Crashes!  "), "breaking market crashes");
/// ```
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_WORD_RUN.replace_all(&lowered, " ").trim().to_string()
}

/// Whether a token is title-cased.
///
/// Uppercase letters may only follow uncased characters and lowercase letters
/// may only follow cased ones; at least one cased letter is required. So
/// `"Quick"` and `"U.S."` qualify while `"McDonald"`, `"NASA"` and `"2025"` do not.
pub fn is_title_case(word: &str) -> bool {
    let mut seen_cased = false;
    let mut previous_cased = false;

    for c in word.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            seen_cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            seen_cased = true;
        } else {
            previous_cased = false;
        }
    }

    seen_cased
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary) with
/// an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_collapses_punctuation() {
        assert_eq!(
            normalize_text("Breaking: Market Crashes Today"),
            "breaking market crashes today"
        );
        assert_eq!(normalize_text("¡Casino -- Expo 2025!"), "casino expo 2025");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_normalize_text_keeps_underscores_and_digits() {
        assert_eq!(normalize_text("slot_12 / Q3"), "slot_12 q3");
    }

    #[test]
    fn test_normalize_text_is_idempotent() {
        let samples = [
            "Local Team Wins",
            "  ...Buy NOW!!! 50% off...  ",
            "Ünïcödé—Headlines\tand\nbreaks",
            "",
            "a",
        ];
        for s in samples {
            let once = normalize_text(s);
            assert_eq!(normalize_text(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_is_title_case() {
        assert!(is_title_case("Quick"));
        assert!(is_title_case("U.S."));
        assert!(is_title_case("Las-Vegas"));
        assert!(!is_title_case("quick"));
        assert!(!is_title_case("NASA"));
        assert!(!is_title_case("McDonald"));
        assert!(!is_title_case("2025"));
        assert!(!is_title_case(""));
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let result = truncate_for_log("ééé", 3);
        assert!(result.starts_with('é'));
        assert!(result.contains("(+4 bytes)"));
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("out/nested");
        let path = nested.to_str().unwrap();
        assert!(ensure_writable_dir(path).await.is_ok());
        assert!(nested.is_dir());
    }
}
