use crate::error::HarvestError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for a harvest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Search terms used to discover storefronts
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Maximum product pages fetched per storefront
    #[serde(default = "default_max_products_per_site")]
    pub max_products_per_site: usize,

    /// Maximum storefronts processed per run
    #[serde(default = "default_max_sites")]
    pub max_sites: usize,

    /// Maximum collection pages visited per storefront during URL discovery
    #[serde(default = "default_max_collection_pages")]
    pub max_collection_pages: usize,

    /// Flush a snapshot after this many recorded products
    #[serde(default = "default_flush_every")]
    pub flush_every: usize,

    /// Directory receiving snapshot artifacts
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name prefix for snapshot artifacts
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Bounded wait for a page to settle, in seconds
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Storefronts processed in parallel (1 = fully sequential)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Pause between product page fetches
    #[serde(default = "default_url_delay")]
    pub url_delay: DelayRange,

    /// Pause between keyword searches
    #[serde(default = "default_keyword_delay")]
    pub keyword_delay: DelayRange,

    /// Pause after each collection page load
    #[serde(default = "default_collection_delay")]
    pub collection_delay: DelayRange,

    /// Search URL template; `{query}` is replaced by the keyword
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Domain suffix shared by hosted storefronts
    #[serde(default = "default_storefront_suffix")]
    pub storefront_suffix: String,

    /// Storefront domains accepted from search results regardless of suffix
    #[serde(default = "default_known_storefronts")]
    pub known_storefronts: Vec<String>,

    /// Origins always crawled ahead of search results
    #[serde(default)]
    pub seed_sites: Vec<String>,

    /// Optional text-generation service used to enrich records
    #[serde(default)]
    pub enrichment: Option<EnrichmentConfig>,
}

/// Inclusive range of milliseconds from which a politeness delay is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn from_secs(min: u64, max: u64) -> Self {
        Self {
            min_ms: min * 1000,
            max_ms: max * 1000,
        }
    }

    pub const fn none() -> Self {
        Self {
            min_ms: 0,
            max_ms: 0,
        }
    }

    /// Draw a uniformly random duration from the range
    pub fn sample(&self) -> Duration {
        let (lo, hi) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        if lo == hi {
            return Duration::from_millis(lo);
        }
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }
}

/// Configuration for the enrichment service (an Ollama-compatible endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Base URL of the service
    #[serde(default = "default_enrichment_endpoint")]
    pub endpoint: String,

    /// Model used for generation
    pub model: String,

    /// Upper bound on a single generation call, in seconds
    #[serde(default = "default_enrichment_timeout_secs")]
    pub timeout_secs: u64,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl EnrichmentConfig {
    pub fn new(model: &str) -> Self {
        Self {
            endpoint: default_enrichment_endpoint(),
            model: model.to_string(),
            timeout_secs: default_enrichment_timeout_secs(),
            temperature: default_temperature(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl HarvestConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, HarvestError> {
        let path = path.as_ref();
        let mut contents = String::new();
        File::open(path)
            .and_then(|mut file| file.read_to_string(&mut contents))
            .map_err(|source| HarvestError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, HarvestError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply environment overrides (currently `WEBDRIVER_URL`)
    pub fn apply_env(&mut self) {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            max_products_per_site: default_max_products_per_site(),
            max_sites: default_max_sites(),
            max_collection_pages: default_max_collection_pages(),
            flush_every: default_flush_every(),
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
            webdriver_url: default_webdriver_url(),
            page_timeout_secs: default_page_timeout_secs(),
            max_concurrency: default_max_concurrency(),
            url_delay: default_url_delay(),
            keyword_delay: default_keyword_delay(),
            collection_delay: default_collection_delay(),
            search_url: default_search_url(),
            storefront_suffix: default_storefront_suffix(),
            known_storefronts: default_known_storefronts(),
            seed_sites: Vec::new(),
            enrichment: None,
        }
    }
}

fn default_keywords() -> Vec<String> {
    [
        "fashion+clothing",
        "beauty+cosmetics",
        "electronics+gadgets",
        "home+decor",
        "fitness+sports",
        "jewelry+accessories",
        "kitchen+appliances",
        "baby+kids",
        "books+media",
        "toys+games",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_products_per_site() -> usize {
    30
}

fn default_max_sites() -> usize {
    10
}

fn default_max_collection_pages() -> usize {
    5
}

fn default_flush_every() -> usize {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("training_data")
}

fn default_file_prefix() -> String {
    "products".to_string()
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_page_timeout_secs() -> u64 {
    30
}

fn default_max_concurrency() -> usize {
    1
}

fn default_url_delay() -> DelayRange {
    DelayRange::from_secs(2, 5)
}

fn default_keyword_delay() -> DelayRange {
    DelayRange::from_secs(3, 7)
}

fn default_collection_delay() -> DelayRange {
    DelayRange::from_secs(2, 2)
}

fn default_search_url() -> String {
    "https://www.google.com/search?q={query}+site:myshopify.com".to_string()
}

fn default_storefront_suffix() -> String {
    "myshopify.com".to_string()
}

fn default_known_storefronts() -> Vec<String> {
    [
        "gymshark.com",
        "allbirds.com",
        "bombas.com",
        "mvmt.com",
        "colourpop.com",
        "fashionnova.com",
        "kylie-cosmetics.com",
        "jeffreestarcosmetics.com",
        "morphe.com",
        "haus-labs.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_enrichment_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_enrichment_timeout_secs() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = HarvestConfig::from_json("{}").unwrap();
        assert_eq!(config.max_sites, 10);
        assert_eq!(config.max_collection_pages, 5);
        assert_eq!(config.max_products_per_site, 30);
        assert_eq!(config.flush_every, 10);
        assert_eq!(config.keywords.len(), 10);
        assert_eq!(config.url_delay, DelayRange::from_secs(2, 5));
        assert!(config.enrichment.is_none());
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "keywords": ["fitness"],
            "max_products_per_site": 50,
            "output_dir": "/tmp/out",
            "enrichment": { "model": "llama3" }
        }"#;
        let config = HarvestConfig::from_json(json).unwrap();
        assert_eq!(config.keywords, vec!["fitness"]);
        assert_eq!(config.max_products_per_site, 50);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));

        let enrichment = config.enrichment.unwrap();
        assert_eq!(enrichment.model, "llama3");
        assert_eq!(enrichment.endpoint, "http://localhost:11434");
        assert_eq!(enrichment.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(
            HarvestConfig::from_json("{ not json"),
            Err(HarvestError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = HarvestConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, HarvestError::ConfigRead { .. }));
    }

    #[test]
    fn test_delay_sampling_stays_in_range() {
        let range = DelayRange {
            min_ms: 20,
            max_ms: 50,
        };
        for _ in 0..100 {
            let d = range.sample();
            assert!(d >= Duration::from_millis(20) && d <= Duration::from_millis(50));
        }
        assert_eq!(DelayRange::none().sample(), Duration::ZERO);

        let inverted = DelayRange {
            min_ms: 9,
            max_ms: 3,
        };
        let d = inverted.sample();
        assert!(d >= Duration::from_millis(3) && d <= Duration::from_millis(9));
    }
}
