//! Product field extraction from rendered storefront pages.
//!
//! Each field is described by an ordered chain of [`FieldStrategy`] values.
//! Strategies are tried in order and the first one producing non-empty text
//! wins. A strategy that matches nothing, or whose selector fails to parse,
//! yields an empty string rather than an error.

use crate::parsers::html::{element_text, fragment_text};
use crate::parsers::text::clean_text;
use crate::results::{ProductRecord, RenderedDocument};
use chrono::Local;
use scraper::{Html, Selector};

/// One way of reading a field out of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStrategy {
    /// Visible text of the first matching element that has some
    Text(&'static str),
    /// Inner markup of the first matching element, converted to plain text
    InnerHtml(&'static str),
    /// Value of an attribute on the first matching element that has a non-empty one
    Attribute(&'static str, &'static str),
}

impl FieldStrategy {
    /// Apply the strategy, returning an empty string when nothing matches
    pub fn apply(&self, doc: &Html) -> String {
        let css = match self {
            FieldStrategy::Text(css)
            | FieldStrategy::InnerHtml(css)
            | FieldStrategy::Attribute(css, _) => *css,
        };
        let Ok(selector) = Selector::parse(css) else {
            ::log::trace!("Skipping unparseable selector {}", css);
            return String::new();
        };

        let mut matches = doc.select(&selector);
        let found = match self {
            FieldStrategy::Text(_) => matches.map(element_text).find(|t| !t.is_empty()),
            FieldStrategy::InnerHtml(_) => matches
                .map(|e| fragment_text(&e.inner_html()))
                .find(|t| !t.is_empty()),
            FieldStrategy::Attribute(_, attr) => matches.find_map(|e| {
                e.value()
                    .attr(attr)
                    .map(clean_text)
                    .filter(|v| !v.is_empty())
            }),
        };
        found.unwrap_or_default()
    }
}

/// Evaluate a chain, short-circuiting on the first non-empty result
pub fn first_match(doc: &Html, chain: &[FieldStrategy]) -> String {
    chain
        .iter()
        .map(|strategy| strategy.apply(doc))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

/// Collect the non-empty texts of all elements matched by the first selector that matches any
pub fn first_list(doc: &Html, chain: &[&str]) -> Vec<String> {
    chain
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .map(|selector| {
            doc.select(&selector)
                .map(element_text)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
        })
        .find(|items| !items.is_empty())
        .unwrap_or_default()
}

pub const TITLE_CHAIN: &[FieldStrategy] = &[
    FieldStrategy::Text("h1"),
    FieldStrategy::Text(".product-title"),
    FieldStrategy::Text(".product__title"),
    FieldStrategy::Text("[class*='title']"),
    FieldStrategy::Text("[class*='name']"),
    FieldStrategy::Attribute("meta[property='og:title']", "content"),
];

pub const DESCRIPTION_CHAIN: &[FieldStrategy] = &[
    FieldStrategy::InnerHtml(".product-description"),
    FieldStrategy::InnerHtml(".product-content"),
    FieldStrategy::InnerHtml("[class*='description']"),
    FieldStrategy::InnerHtml(".rte"),
    FieldStrategy::InnerHtml(".product-single__description"),
    FieldStrategy::Attribute("meta[name='description']", "content"),
];

pub const PRICE_CHAIN: &[FieldStrategy] = &[
    FieldStrategy::Text(".price"),
    FieldStrategy::Text(".product-price"),
    FieldStrategy::Text("[class*='price']"),
    FieldStrategy::Text(".money"),
    FieldStrategy::Attribute("meta[property='product:price:amount']", "content"),
];

pub const CATEGORY_CHAIN: &[&str] = &[".breadcrumb a", ".breadcrumbs a", "nav a"];

pub const FEATURE_CHAIN: &[&str] = &[".product-features li", ".product-details li", "ul li"];

/// Separator between breadcrumb entries in `ProductRecord::category`
pub const CATEGORY_SEPARATOR: &str = " > ";

/// Field selector chains used to turn a rendered page into a `ProductRecord`
#[derive(Debug, Clone)]
pub struct Extractor {
    pub title: Vec<FieldStrategy>,
    pub description: Vec<FieldStrategy>,
    pub price: Vec<FieldStrategy>,
    pub category: Vec<&'static str>,
    pub features: Vec<&'static str>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            title: TITLE_CHAIN.to_vec(),
            description: DESCRIPTION_CHAIN.to_vec(),
            price: PRICE_CHAIN.to_vec(),
            category: CATEGORY_CHAIN.to_vec(),
            features: FEATURE_CHAIN.to_vec(),
        }
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract a product from a rendered page.
    ///
    /// Returns `None` unless both title and description are non-empty after cleaning.
    pub fn extract(&self, doc: &RenderedDocument) -> Option<ProductRecord> {
        self.extract_html(&doc.html, &doc.url)
    }

    pub fn extract_html(&self, html: &str, url: &str) -> Option<ProductRecord> {
        let doc = Html::parse_document(html);

        let title = first_match(&doc, &self.title);
        if title.is_empty() {
            ::log::debug!("No title found on {}", url);
            return None;
        }

        let description = first_match(&doc, &self.description);
        if description.is_empty() {
            ::log::debug!("No description found on {}", url);
            return None;
        }

        Some(ProductRecord {
            url: url.to_string(),
            title,
            description,
            price: first_match(&doc, &self.price),
            category: first_list(&doc, &self.category).join(CATEGORY_SEPARATOR),
            features: first_list(&doc, &self.features),
            scraped_at: Local::now(),
            enrichment: None,
        })
    }
}
