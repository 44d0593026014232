//! HTML input-field scraping, the fallback for non-JSON bodies.

use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::params::is_valid_name;
use crate::types::buckets::ValueMultimap;

static INPUT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input").expect("valid input selector"));

/// Field names and values scraped from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldScrape {
    /// Valid field names, from `name` or `id`.
    pub names: BTreeSet<String>,
    /// Field name → non-blank `value` attributes.
    pub values: ValueMultimap,
}

impl FieldScrape {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Collect `hidden` and `text` input fields.
///
/// The field name comes from `name`, or `id` when `name` is blank. Values
/// are only recorded when non-blank. Malformed markup is parsed leniently.
pub fn scrape_fields(html: &str) -> FieldScrape {
    let document = Html::parse_document(html);
    let mut scrape = FieldScrape::default();

    for input in document.select(&INPUT) {
        let element = input.value();
        if !matches!(element.attr("type"), Some("hidden") | Some("text")) {
            continue;
        }

        let name = match element.attr("name") {
            Some(name) if !name.trim().is_empty() => name,
            _ => element.attr("id").unwrap_or_default(),
        };
        if !is_valid_name(name) {
            continue;
        }

        scrape.names.insert(name.to_string());
        if let Some(value) = element.attr("value").filter(|v| !v.trim().is_empty()) {
            scrape.values.insert(name, value);
        }
    }

    scrape
}
