//! Markup-agnostic candidate harvesting for building a labelling corpus.
//!
//! Unlike the [`scanner`](super::scanner), this does not rely on page-specific
//! class names: every `article` and `div` is treated as a possible item, which
//! over-collects on purpose. The rows come out with `IsNews = 0` and are meant
//! to be labelled by hand before training.

use super::{element_text, find_first};
use crate::models::HarvestedRow;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument};

static BLOCK: Lazy<Selector> = Lazy::new(|| Selector::parse("article, div").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1, h2, h3, a").unwrap());
static KICKER: Lazy<Selector> = Lazy::new(|| Selector::parse("h4, h5, span, strong").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").unwrap());

/// Collect one row per block that has both a title and a link, dropping
/// repeated titles (first occurrence wins).
///
/// # Returns
///
/// Rows in document order, ready for [`write_harvest`](crate::outputs::corpus::write_harvest).
#[instrument(level = "info", skip_all)]
pub fn harvest(document: &Html) -> Vec<HarvestedRow> {
    let rows = document
        .select(&BLOCK)
        .filter_map(harvest_block)
        .unique_by(|row| row.title.clone())
        .collect::<Vec<_>>();

    info!(count = rows.len(), "Harvested corpus candidates");
    rows
}

fn harvest_block(block: ElementRef<'_>) -> Option<HarvestedRow> {
    let title = find_first(block, &TITLE).and_then(element_text)?;
    let link = find_first(block, &LINK)?.value().attr("href")?.trim().to_string();
    let kicker = find_first(block, &KICKER).and_then(element_text);
    let image = find_first(block, &IMAGE)
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string);

    Some(HarvestedRow {
        title,
        kicker,
        link,
        image,
        is_news: 0,
    })
}
