//! Structural extraction over a parsed document tree.
//!
//! This module contains the pieces that turn a rendered page into raw
//! records, before any classification happens:
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Candidate discovery | [`scanner`] | container elements in document order |
//! | Field extraction | [`fields`] | one [`ExtractedRecord`](crate::models::ExtractedRecord) per container |
//! | Corpus harvesting | [`harvest`] | unlabelled rows for building a training corpus |
//!
//! All markup knowledge comes in as [`MatchRule`] data and is compiled once
//! into a [`RuleSet`], so a markup change is a configuration change.

pub mod fields;
pub mod harvest;
pub mod scanner;

use crate::config::MatchRule;
use crate::error::ConfigError;
use regex::Regex;
use scraper::{ElementRef, Selector};
use url::Url;

/// A [`MatchRule`] with its selector and pattern compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    name: String,
    selector: Selector,
    attribute: String,
    pattern: Option<Regex>,
}

impl CompiledRule {
    /// Compile a single rule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the selector or the pattern does not parse.
    pub fn compile(rule: &MatchRule) -> Result<Self, ConfigError> {
        let selector = parse_selector(&rule.name, &rule.selector)?;
        let pattern = rule
            .pattern
            .as_deref()
            .map(|p| {
                Regex::new(p).map_err(|source| ConfigError::Pattern {
                    rule: rule.name.clone(),
                    pattern: p.to_string(),
                    source,
                })
            })
            .transpose()?;

        Ok(Self {
            name: rule.name.clone(),
            selector,
            attribute: rule.attribute.clone(),
            pattern,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `element` satisfies this rule.
    ///
    /// The pattern is searched against the whole attribute value and, for
    /// `class`, against each individual class name as well.
    pub fn matches(&self, element: &ElementRef<'_>) -> bool {
        if !self.selector.matches(element) {
            return false;
        }
        let Some(pattern) = &self.pattern else {
            return true;
        };
        let Some(value) = element.value().attr(&self.attribute) else {
            return false;
        };
        pattern.is_match(value)
            || (self.attribute == "class" && element.value().classes().any(|c| pattern.is_match(c)))
    }
}

/// An ordered list of compiled rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile every rule, failing on the first invalid one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for the first rule that does not compile.
    pub fn compile(rules: &[MatchRule]) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub(crate) fn len(&self) -> usize {
        self.rules.len()
    }

    /// The first rule (in declaration order) matching `element`.
    pub fn first_match(&self, element: &ElementRef<'_>) -> Option<&CompiledRule> {
        self.rules.iter().find(|rule| rule.matches(element))
    }

    /// Search `scope`'s descendants rule by rule: the first rule that matches
    /// anything wins, and within a rule the first match in document order.
    pub fn find_in<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.rules
            .iter()
            .find_map(|rule| descendant_elements(scope).find(|el| rule.matches(el)))
    }
}

/// Parse a CSS selector, attributing failures to `rule`.
pub(crate) fn parse_selector(rule: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::Selector {
        rule: rule.to_string(),
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Every element strictly below `scope`, in document order.
pub(crate) fn descendant_elements<'a>(
    scope: ElementRef<'a>,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    scope.descendants().skip(1).filter_map(ElementRef::wrap)
}

/// First element strictly below `scope` matching `selector`.
pub(crate) fn find_first<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    descendant_elements(scope).find(|el| selector.matches(el))
}

/// Concatenated, trimmed text of an element; `None` when it is blank.
pub(crate) fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Resolve a possibly relative `href`/`src` against `base`. Values that do not
/// resolve are returned as-is.
pub(crate) fn resolve_url(base: Option<&Url>, raw: &str) -> String {
    let raw = raw.trim();
    match base {
        Some(base) => base
            .join(raw)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => raw.to_string(),
    }
}
