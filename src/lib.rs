// Re-export modules
pub mod config;
pub mod crawlers;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod interrupt;
pub mod parsers;
pub mod results;
pub mod storage;
pub mod utils;
pub mod visited;

// Re-export commonly used types for convenience
pub use config::{EnrichmentConfig, HarvestConfig};
pub use error::HarvestError;
pub use interrupt::Interrupt;
pub use results::{ProductRecord, RunSummary};

use crawlers::{Collector, Fetcher, SiteDiscoverer, UrlDiscoverer};
use enrich::OllamaEnricher;
use std::path::PathBuf;
use std::sync::Arc;

/// Main builder for a harvest run
pub struct Harvest {
    config: HarvestConfig,
}

impl Default for Harvest {
    fn default() -> Self {
        Self::new()
    }
}

impl Harvest {
    /// Create a builder with the default configuration
    pub fn new() -> Self {
        Self {
            config: HarvestConfig::default(),
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: HarvestConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a file
    pub fn with_config_file(self, path: impl AsRef<std::path::Path>) -> Result<Self, HarvestError> {
        let config = HarvestConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load configuration from a string
    pub fn with_config_str(self, config_str: &str) -> Result<Self, HarvestError> {
        let config = HarvestConfig::from_json(config_str)?;
        Ok(self.with_config(config))
    }

    /// Search terms; an empty list keeps the configured ones
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        if !keywords.is_empty() {
            self.config.keywords = keywords;
        }
        self
    }

    pub fn with_max_products(mut self, max_products: usize) -> Self {
        self.config.max_products_per_site = max_products;
        self
    }

    pub fn with_max_sites(mut self, max_sites: usize) -> Self {
        self.config.max_sites = max_sites;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = output_dir.into();
        self
    }

    /// Set the number of storefronts processed in parallel
    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_webdriver_url(mut self, webdriver_url: &str) -> Self {
        self.config.webdriver_url = webdriver_url.to_string();
        self
    }

    /// Enable enrichment with the given model
    pub fn with_model(mut self, model: &str) -> Self {
        match &mut self.config.enrichment {
            Some(enrichment) => enrichment.model = model.to_string(),
            None => self.config.enrichment = Some(EnrichmentConfig::new(model)),
        }
        self
    }

    /// Point enrichment at another service; has no effect until a model is set
    pub fn with_enrichment_endpoint(mut self, endpoint: &str) -> Self {
        if let Some(enrichment) = &mut self.config.enrichment {
            enrichment.endpoint = endpoint.to_string();
        }
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Run the harvest until every discovered site is processed or `interrupt` fires
    pub async fn run(self, interrupt: Interrupt) -> Result<RunSummary, HarvestError> {
        let mut config = self.config;
        config.apply_env();

        if config.keywords.is_empty() && config.seed_sites.is_empty() {
            return Err(HarvestError::NoKeywords);
        }

        ::log::info!(
            "Harvesting with {} keyword(s), up to {} site(s) and {} product(s) per site",
            config.keywords.len(),
            config.max_sites,
            config.max_products_per_site
        );

        let fetcher = Arc::new(Fetcher::new(
            &config.webdriver_url,
            config.page_timeout(),
            config.max_concurrency,
        ));
        let sites = SiteDiscoverer::new(&config, interrupt.clone())?;
        let urls = UrlDiscoverer::new(Arc::clone(&fetcher), &config, interrupt.clone());

        let mut collector = Collector::new(sites, urls, fetcher, &config, interrupt);
        if let Some(enrichment) = &config.enrichment {
            ::log::info!("Enriching records with model {}", enrichment.model);
            collector = collector.with_enricher(Arc::new(OllamaEnricher::new(enrichment.clone())?));
        }

        Ok(collector.run().await)
    }
}
