use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One product extracted from a single rendered page.
///
/// Built once by the extractor and never modified after it enters the run buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// URL of the product page, unique within a run
    pub url: String,

    /// Product title (never empty)
    pub title: String,

    /// Plain-text description (never empty, no markup)
    pub description: String,

    /// Price as displayed on the page
    pub price: String,

    /// Breadcrumb trail joined with `" > "`
    pub category: String,

    /// Feature bullet points in document order
    pub features: Vec<String>,

    /// When the page was extracted
    pub scraped_at: DateTime<Local>,

    /// Generated description, when an enrichment service was configured and answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<Enrichment>,
}

/// Text attached to a record by the enrichment service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub text: String,
    pub model: String,
}

impl ProductRecord {
    /// Prompt handed to the enrichment service for this record.
    pub fn enrichment_prompt(&self) -> String {
        let features = self
            .features
            .iter()
            .take(3)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Create a brief, compelling product description enhancement for:\n\
             Title: {}\n\
             Category: {}\n\
             Features: {}\n\n\
             Provide only the enhanced description, no additional text.",
            self.title, self.category, features
        )
    }

    /// Flatten the record into a tabular row.
    pub fn to_row(&self) -> ProductRow<'_> {
        ProductRow {
            url: &self.url,
            title: &self.title,
            description: &self.description,
            price: &self.price,
            category: &self.category,
            features: serde_json::to_string(&self.features).unwrap_or_else(|_| "[]".to_string()),
            scraped_at: self.scraped_at.to_rfc3339(),
            enriched_description: self.enrichment.as_ref().map(|e| e.text.as_str()),
            enrichment_model: self.enrichment.as_ref().map(|e| e.model.as_str()),
        }
    }
}

/// A record flattened to one CSV row; list-valued fields become JSON strings.
#[derive(Debug, Serialize)]
pub struct ProductRow<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub price: &'a str,
    pub category: &'a str,
    pub features: String,
    pub scraped_at: String,
    pub enriched_description: Option<&'a str>,
    pub enrichment_model: Option<&'a str>,
}

/// A page as rendered by the browser, after scripts have run.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// URL that was requested
    pub url: String,

    /// URL the browser ended up on (after redirects)
    pub final_url: String,

    /// Serialized DOM
    pub html: String,
}

impl RenderedDocument {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            html: html.into(),
        }
    }
}

/// A storefront origin and the bounded list of product URLs found under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub origin: String,
    pub product_urls: Vec<String>,
}

impl CrawlTarget {
    pub fn new(origin: String, mut product_urls: Vec<String>, max_products: usize) -> Self {
        product_urls.truncate(max_products);
        Self {
            origin,
            product_urls,
        }
    }
}

/// Paths of the two artifacts written by one flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotPaths {
    pub json: Option<PathBuf>,
    pub csv: Option<PathBuf>,
}

/// Totals reported at the end of a run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Valid records collected
    pub records: usize,
    /// URLs handed to the fetcher
    pub attempted: usize,
    pub duplicates_skipped: usize,
    pub fetch_failures: usize,
    pub invalid_pages: usize,
    pub sites_processed: usize,
    pub interrupted: bool,
    /// Artifacts of the final flush, if anything was written
    pub last_snapshot: Option<SnapshotPaths>,
}
