//! Field extraction from a single candidate container.
//!
//! Missing sub-elements become `None` fields; extraction never fails, so one
//! malformed container cannot abort its siblings.

use super::{RuleSet, element_text, find_first, parse_selector, resolve_url};
use crate::config::FieldsConfig;
use crate::error::ConfigError;
use crate::models::ExtractedRecord;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use tracing::trace;
use url::Url;

static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static IMG_WITH_SRC: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").unwrap());
static ANCHOR_WITH_HREF: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Pulls Title, Kicker, Image and Link out of candidate containers.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    title: RuleSet,
    kicker: RuleSet,
    image_container: Selector,
    base_url: Option<Url>,
}

impl FieldExtractor {
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a field rule, the image container selector
    /// or the base URL is invalid.
    pub fn from_config(config: &FieldsConfig) -> Result<Self, ConfigError> {
        let base_url = config
            .base_url
            .as_deref()
            .map(|u| {
                Url::parse(u).map_err(|source| ConfigError::BaseUrl {
                    url: u.to_string(),
                    source,
                })
            })
            .transpose()?;

        Ok(Self {
            title: RuleSet::compile(&config.title)?,
            kicker: RuleSet::compile(&config.kicker)?,
            image_container: parse_selector("image_container", &config.image_container)?,
            base_url,
        })
    }

    /// Extract the field set of one container.
    pub fn extract(&self, container: ElementRef<'_>) -> ExtractedRecord {
        let title_element = self.title.find_in(container);
        let title = title_element.and_then(element_text);
        let kicker = self.kicker.find_in(container).and_then(element_text);
        let image = self
            .image_src(container)
            .map(|src| resolve_url(self.base_url.as_ref(), src));
        let link = title_element
            .and_then(|heading| title_link(container, heading))
            .map(|href| resolve_url(self.base_url.as_ref(), href));

        trace!(
            has_title = title.is_some(),
            has_kicker = kicker.is_some(),
            has_image = image.is_some(),
            has_link = link.is_some(),
            "Extracted candidate fields"
        );

        ExtractedRecord {
            title,
            kicker,
            image,
            link,
        }
    }

    /// `src` of the first image in the image sub-container, or of the first
    /// image anywhere in the container when there is no sub-container.
    fn image_src<'a>(&self, container: ElementRef<'a>) -> Option<&'a str> {
        match find_first(container, &self.image_container) {
            Some(sub) => find_first(sub, &IMG)?.value().attr("src"),
            None => find_first(container, &IMG_WITH_SRC)?.value().attr("src"),
        }
    }
}

/// The anchor belonging to the title: one nested inside the heading, or else
/// one wrapping it (without leaving the container).
fn title_link<'a>(container: ElementRef<'a>, heading: ElementRef<'a>) -> Option<&'a str> {
    if let Some(anchor) = find_first(heading, &ANCHOR_WITH_HREF) {
        return anchor.value().attr("href");
    }
    heading
        .ancestors()
        .take_while(|node| node.id() != container.id())
        .filter_map(ElementRef::wrap)
        .find(|el| ANCHOR_WITH_HREF.matches(el))
        .and_then(|anchor| anchor.value().attr("href"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScannerConfig;
    use crate::scrapers::scanner::DocumentScanner;
    use scraper::Html;

    fn extract_all(html: &str, config: &FieldsConfig) -> Vec<ExtractedRecord> {
        let document = Html::parse_document(html);
        let scanner = DocumentScanner::from_config(&ScannerConfig::default()).unwrap();
        let extractor = FieldExtractor::from_config(config).unwrap();
        scanner
            .scan(&document)
            .into_iter()
            .map(|c| extractor.extract(c))
            .collect()
    }

    #[test]
    fn test_extract_full_slot() {
        let html = r#"
            <div class="slot slot_0 noticia cargada">
              <div class="contenedor_imagen"><div class="imagen"><a href="/x"><img src="https://cdn.site.com/a.jpg"></a></div></div>
              <div class="volanta fuente_roboto_slab">  Gaming  </div>
              <h2 class="titulo fuente_roboto_slab"><a href="https://site.com/news/123">Breaking: Market Crashes Today</a></h2>
              <a href="https://site.com/unrelated">Read more</a>
            </div>"#;
        let records = extract_all(html, &FieldsConfig::default());
        assert_eq!(
            records,
            vec![ExtractedRecord {
                title: Some("Breaking: Market Crashes Today".to_string()),
                kicker: Some("Gaming".to_string()),
                image: Some("https://cdn.site.com/a.jpg".to_string()),
                link: Some("https://site.com/news/123".to_string()),
            }]
        );
    }

    #[test]
    fn test_missing_sub_elements_become_none() {
        let html = r#"
            <div class="slot slot_1 noticia"><p>Only a paragraph</p></div>
            <div class="slot slot_2 noticia"><h2 class="titulo fuente_roboto_slab">No link here</h2></div>"#;
        let records = extract_all(html, &FieldsConfig::default());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], ExtractedRecord::default());
        assert_eq!(records[1].title.as_deref(), Some("No link here"));
        assert!(records[1].link.is_none());
        assert!(records[1].kicker.is_none());
        assert!(records[1].image.is_none());
    }

    #[test]
    fn test_link_ignores_unrelated_anchor() {
        let html = r#"
            <div class="slot slot_1 noticia">
              <a href="https://ads.com/promo">Sponsored</a>
              <h2>Plain heading</h2>
            </div>"#;
        let records = extract_all(html, &FieldsConfig::default());
        assert_eq!(records[0].title.as_deref(), Some("Plain heading"));
        assert!(records[0].link.is_none());
    }

    #[test]
    fn test_link_from_wrapping_anchor() {
        let html = r#"
            <div class="slot slot_1 noticia">
              <a href="https://site.com/news/7"><h3>Wrapped heading</h3></a>
            </div>"#;
        let records = extract_all(html, &FieldsConfig::default());
        assert_eq!(records[0].link.as_deref(), Some("https://site.com/news/7"));
    }

    #[test]
    fn test_image_container_without_img_is_none() {
        let html = r#"
            <div class="slot slot_1 noticia">
              <div class="imagen"></div>
              <img src="https://cdn.site.com/logo.png">
            </div>"#;
        let records = extract_all(html, &FieldsConfig::default());
        assert!(records[0].image.is_none());
    }

    #[test]
    fn test_image_falls_back_to_any_img() {
        let html = r#"
            <div class="slot slot_1 noticia">
              <figure><img alt="no src"><img src="/img/b.png"></figure>
            </div>"#;
        let records = extract_all(html, &FieldsConfig::default());
        assert_eq!(records[0].image.as_deref(), Some("/img/b.png"));
    }

    #[test]
    fn test_relative_urls_resolved_against_base() {
        let html = r#"
            <div class="slot slot_1 noticia">
              <img src="/img/c.png">
              <h2 class="titulo fuente_roboto_slab"><a href="/international/news/2025/01/01/x">Relative</a></h2>
            </div>"#;
        let config = FieldsConfig {
            base_url: Some("https://www.site.com/international/".to_string()),
            ..FieldsConfig::default()
        };
        let records = extract_all(html, &config);
        assert_eq!(
            records[0].link.as_deref(),
            Some("https://www.site.com/international/news/2025/01/01/x")
        );
        assert_eq!(records[0].image.as_deref(), Some("https://www.site.com/img/c.png"));
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let config = FieldsConfig {
            base_url: Some("not a url".to_string()),
            ..FieldsConfig::default()
        };
        assert!(matches!(
            FieldExtractor::from_config(&config),
            Err(ConfigError::BaseUrl { .. })
        ));
    }
}
