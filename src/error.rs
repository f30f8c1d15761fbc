use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A page failed to load, render or settle within its bounded wait.
///
/// Always recoverable: the Collector skips the URL and keeps going.
#[derive(Debug, Error)]
#[error("failed to fetch {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: impl ToString) -> Self {
        Self {
            url: url.into(),
            cause: cause.to_string(),
        }
    }
}

/// A keyword query, a site root or a collection page could not be loaded.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("search for keyword '{keyword}' failed: {cause}")]
    Search { keyword: String, cause: String },

    #[error("site root {0} could not be loaded")]
    SiteRoot(#[source] FetchError),

    #[error("collection page {0} could not be loaded")]
    CollectionPage(#[source] FetchError),
}

/// The enrichment service did not produce usable text.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("enrichment timed out after {0:?}")]
    Timeout(Duration),

    #[error("enrichment request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("enrichment service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("enrichment service returned an empty response")]
    EmptyResponse,
}

/// A snapshot artifact could not be written.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("i/o error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize structured snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write tabular snapshot: {0}")]
    Csv(#[from] csv::Error),
}

impl PersistenceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that can stop a run before the Collector starts.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("no keywords given")]
    NoKeywords,
}
