use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "product-harvest")]
#[command(about = "Discovers storefronts and harvests product pages into JSON and CSV snapshots")]
#[command(version)]
pub struct Args {
    /// Search keywords used to discover storefronts (defaults to the configured list)
    pub keywords: Vec<String>,

    /// Maximum product pages fetched per storefront
    #[arg(long)]
    pub max_products: Option<usize>,

    /// Maximum storefronts processed
    #[arg(long)]
    pub max_sites: Option<usize>,

    /// Directory receiving the snapshot files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of storefronts processed in parallel
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// WebDriver endpoint (the WEBDRIVER_URL environment variable takes precedence)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Enrichment model; enables enrichment when set
    #[arg(short, long)]
    pub model: Option<String>,

    /// Base URL of the enrichment service
    #[arg(long, default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// List the models available on the enrichment service and exit
    #[arg(long)]
    pub list_models: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_and_flags() {
        let args = Args::parse_from([
            "product-harvest",
            "fitness+sports",
            "home+decor",
            "--max-products",
            "40",
            "--concurrency",
            "2",
            "--model",
            "llama3",
        ]);
        assert_eq!(args.keywords, vec!["fitness+sports", "home+decor"]);
        assert_eq!(args.max_products, Some(40));
        assert_eq!(args.concurrency, Some(2));
        assert_eq!(args.model.as_deref(), Some("llama3"));
        assert_eq!(args.ollama_url, "http://localhost:11434");
        assert!(!args.list_models);
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["product-harvest"]);
        assert!(args.keywords.is_empty());
        assert!(args.max_sites.is_none());
        assert!(args.config.is_none());
    }
}
