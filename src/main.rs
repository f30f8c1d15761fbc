use clap::Parser;
use product_harvest::enrich::OllamaEnricher;
use product_harvest::{EnrichmentConfig, Harvest, HarvestError, Interrupt, RunSummary};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    if args.list_models {
        list_models(&args).await;
        return;
    }

    let harvest = match build(&args) {
        Ok(harvest) => harvest,
        Err(e) => {
            ::log::error!("Failed to configure harvest: {}", e);
            std::process::exit(1);
        }
    };

    println!("Note: product pages are rendered through a WebDriver server (e.g., ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL environment variable if not using {}",
        harvest.config().webdriver_url
    );

    let start_time = std::time::Instant::now();
    let summary = match harvest.run(Interrupt::on_ctrl_c()).await {
        Ok(summary) => summary,
        Err(e) => {
            ::log::error!("Failed to start harvest: {}", e);
            std::process::exit(1);
        }
    };

    ::log::info!(
        "Harvest complete - {} products in {:.2} seconds",
        summary.records,
        start_time.elapsed().as_secs_f64()
    );
    report(&summary);
}

fn build(args: &Args) -> Result<Harvest, HarvestError> {
    let mut harvest = Harvest::new();
    if let Some(path) = &args.config {
        harvest = harvest.with_config_file(path)?;
    }

    harvest = harvest.with_keywords(args.keywords.clone());
    if let Some(n) = args.max_products {
        harvest = harvest.with_max_products(n);
    }
    if let Some(n) = args.max_sites {
        harvest = harvest.with_max_sites(n);
    }
    if let Some(dir) = &args.output_dir {
        harvest = harvest.with_output_dir(dir);
    }
    if let Some(n) = args.concurrency {
        harvest = harvest.with_concurrency(n);
    }
    if let Some(url) = &args.webdriver_url {
        harvest = harvest.with_webdriver_url(url);
    }
    if let Some(model) = &args.model {
        harvest = harvest
            .with_model(model)
            .with_enrichment_endpoint(&args.ollama_url);
    }
    Ok(harvest)
}

async fn list_models(args: &Args) {
    let mut config = EnrichmentConfig::new(args.model.as_deref().unwrap_or_default());
    config.endpoint = args.ollama_url.clone();

    let result = match OllamaEnricher::new(config) {
        Ok(enricher) => enricher.list_models().await,
        Err(e) => Err(e.into()),
    };
    match result {
        Ok(models) if models.is_empty() => println!("No models installed at {}", args.ollama_url),
        Ok(models) => {
            println!("Available models:");
            for model in models {
                println!("  {}", model);
            }
        }
        Err(e) => {
            ::log::error!("Could not list models at {}: {}", args.ollama_url, e);
            std::process::exit(1);
        }
    }
}

fn report(summary: &RunSummary) {
    if summary.interrupted {
        println!("Interrupted - saved what was collected so far.");
    }
    println!("Collected {} products", summary.records);
    println!(
        "  attempted {}, duplicates skipped {}, fetch failures {}, invalid pages {}, sites {}",
        summary.attempted,
        summary.duplicates_skipped,
        summary.fetch_failures,
        summary.invalid_pages,
        summary.sites_processed
    );

    match &summary.last_snapshot {
        Some(paths) => {
            for path in paths.json.iter().chain(paths.csv.iter()) {
                println!("Saved: {}", path.display());
            }
        }
        None => println!("Nothing was saved"),
    }
}
