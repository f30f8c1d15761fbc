use crate::config::{DelayRange, HarvestConfig};
use crate::crawlers::crawler::{PageFetcher, ProductUrlSource, SiteSource};
use crate::enrich::{Enricher, generate_bounded};
use crate::interrupt::Interrupt;
use crate::parsers::Extractor;
use crate::results::{CrawlTarget, Enrichment, ProductRecord, RunSummary, SnapshotPaths};
use crate::storage::SnapshotWriter;
use crate::utils::polite_pause;
use crate::visited::VisitedSet;
use futures::FutureExt;
use futures::stream::{self, StreamExt};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Where the Collector currently is in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    DiscoveringSites,
    DiscoveringUrls,
    Fetching,
    Extracting,
    Recording,
    Flushing,
    Done,
}

#[derive(Debug, Default)]
struct Counters {
    attempted: AtomicUsize,
    duplicates_skipped: AtomicUsize,
    fetch_failures: AtomicUsize,
    invalid_pages: AtomicUsize,
    sites_processed: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Outcome of handling one product URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UrlOutcome {
    Duplicate,
    FetchFailed,
    Invalid,
    Recorded,
}

impl UrlOutcome {
    fn hit_network(self) -> bool {
        self != UrlOutcome::Duplicate
    }
}

/// Drives a harvest run: discover sites, discover product URLs per site,
/// fetch and extract each URL once, buffer the records and flush snapshots.
///
/// No single page, site or keyword failure ends a run. The only early exit is
/// the [`Interrupt`], and every exit path goes through a final flush and a
/// fetcher shutdown.
pub struct Collector<S, U, F> {
    sites: S,
    urls: U,
    fetcher: F,
    extractor: Extractor,
    enricher: Option<Arc<dyn Enricher>>,
    visited: VisitedSet,
    buffer: Mutex<Vec<ProductRecord>>,
    writer: Arc<SnapshotWriter>,
    // Size and artifacts of the largest complete snapshot written so far
    flushed: Mutex<Option<(usize, SnapshotPaths)>>,
    interrupt: Interrupt,
    phase: Mutex<Phase>,
    counters: Counters,

    keywords: Vec<String>,
    max_sites: usize,
    max_products_per_site: usize,
    flush_every: usize,
    url_delay: DelayRange,
    max_concurrency: usize,
}

impl<S, U, F> Collector<S, U, F>
where
    S: SiteSource,
    U: ProductUrlSource,
    F: PageFetcher,
{
    pub fn new(
        sites: S,
        urls: U,
        fetcher: F,
        config: &HarvestConfig,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            sites,
            urls,
            fetcher,
            extractor: Extractor::new(),
            enricher: None,
            visited: VisitedSet::new(),
            buffer: Mutex::new(Vec::new()),
            writer: Arc::new(SnapshotWriter::new(&config.output_dir, &config.file_prefix)),
            flushed: Mutex::new(None),
            interrupt,
            phase: Mutex::new(Phase::Idle),
            counters: Counters::default(),
            keywords: config.keywords.clone(),
            max_sites: config.max_sites,
            max_products_per_site: config.max_products_per_site,
            flush_every: config.flush_every,
            url_delay: config.url_delay,
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Start from an existing set of visited URLs
    pub fn with_visited(mut self, visited: VisitedSet) -> Self {
        self.visited = visited;
        self
    }

    pub fn phase(&self) -> Phase {
        *lock(&self.phase)
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    /// Point-in-time copy of everything recorded so far
    pub fn records(&self) -> Vec<ProductRecord> {
        lock(&self.buffer).clone()
    }

    /// Run the whole pipeline to completion or interruption
    pub async fn run(&self) -> RunSummary {
        let crawl = AssertUnwindSafe(self.crawl()).catch_unwind().await;
        if crawl.is_err() {
            ::log::error!("Crawl aborted unexpectedly, flushing what was collected");
        }
        self.finish().await
    }

    async fn crawl(&self) {
        self.set_phase(Phase::DiscoveringSites);
        let mut sites = self.sites.discover_sites(&self.keywords).await;
        ::log::info!("Discovered {} storefront(s)", sites.len());

        if sites.len() > self.max_sites {
            ::log::info!("Limiting run to the first {} storefront(s)", self.max_sites);
            sites.truncate(self.max_sites);
        }

        stream::iter(sites.iter())
            .for_each_concurrent(self.max_concurrency, |site| self.process_site(site))
            .await;
    }

    async fn process_site(&self, site: &str) {
        if self.interrupt.is_triggered() {
            return;
        }

        self.set_phase(Phase::DiscoveringUrls);
        ::log::info!("Processing storefront: {}", site);
        let urls = self.urls.discover_product_urls(site).await;
        let target = CrawlTarget::new(site.to_string(), urls, self.max_products_per_site);
        Counters::bump(&self.counters.sites_processed);

        if target.product_urls.is_empty() {
            ::log::info!("No product pages found on {}", target.origin);
            return;
        }
        ::log::info!(
            "Crawling {} product page(s) on {}",
            target.product_urls.len(),
            target.origin
        );

        let last = target.product_urls.len() - 1;
        for (i, url) in target.product_urls.iter().enumerate() {
            if self.interrupt.is_triggered() {
                ::log::info!("Interrupted, leaving {}", target.origin);
                break;
            }

            let outcome = self.process_url(url).await;
            if outcome.hit_network()
                && i < last
                && !polite_pause(&self.url_delay, &self.interrupt).await
            {
                break;
            }
        }
    }

    async fn process_url(&self, url: &str) -> UrlOutcome {
        if !self.visited.claim(url) {
            ::log::debug!("Already handled: {}", url);
            Counters::bump(&self.counters.duplicates_skipped);
            return UrlOutcome::Duplicate;
        }

        self.set_phase(Phase::Fetching);
        Counters::bump(&self.counters.attempted);
        let doc = match self.fetcher.fetch(url).await {
            Ok(doc) => doc,
            Err(e) => {
                ::log::warn!("{}", e);
                Counters::bump(&self.counters.fetch_failures);
                self.visited.release(url);
                return UrlOutcome::FetchFailed;
            }
        };

        self.set_phase(Phase::Extracting);
        let Some(mut record) = self.extractor.extract(&doc) else {
            ::log::debug!("No valid product data at {}", url);
            Counters::bump(&self.counters.invalid_pages);
            self.visited.release(url);
            return UrlOutcome::Invalid;
        };

        if let Some(enricher) = &self.enricher {
            match generate_bounded(enricher.as_ref(), &record.enrichment_prompt()).await {
                Ok(text) => {
                    record.enrichment = Some(Enrichment {
                        text,
                        model: enricher.model().to_string(),
                    })
                }
                Err(e) => ::log::warn!("Enrichment failed for {}: {}", url, e),
            }
        }

        self.set_phase(Phase::Recording);
        let due = self.record(record);
        self.visited.mark(url);

        if let Some(snapshot) = due {
            self.set_phase(Phase::Flushing);
            self.flush(snapshot).await;
        }
        UrlOutcome::Recorded
    }

    /// Append to the run buffer, returning a snapshot when a flush is due.
    ///
    /// The snapshot is taken in the same critical section as the append.
    fn record(&self, record: ProductRecord) -> Option<Vec<ProductRecord>> {
        let mut buffer = lock(&self.buffer);
        ::log::info!("Recorded product #{}: {}", buffer.len() + 1, record.title);
        buffer.push(record);

        let due = self.flush_every > 0 && buffer.len() % self.flush_every == 0;
        due.then(|| buffer.clone())
    }

    /// Write a snapshot on the blocking pool
    async fn flush(&self, records: Vec<ProductRecord>) -> Option<SnapshotPaths> {
        let writer = Arc::clone(&self.writer);
        let report = match tokio::task::spawn_blocking(move || writer.flush(&records)).await {
            Ok(report) => report?,
            Err(e) => {
                ::log::error!("Snapshot task failed: {}", e);
                return None;
            }
        };

        let paths = report.paths();
        if report.is_complete() {
            let mut flushed = lock(&self.flushed);
            if flushed.as_ref().is_none_or(|(n, _)| *n < report.records) {
                *flushed = Some((report.records, paths.clone()));
            }
        } else {
            ::log::warn!("Snapshot of {} records was only partially written", report.records);
        }
        Some(paths)
    }

    async fn finish(&self) -> RunSummary {
        self.set_phase(Phase::Flushing);
        let records = self.records();
        let already_saved = lock(&self.flushed)
            .as_ref()
            .filter(|(n, _)| *n == records.len())
            .map(|(_, paths)| paths.clone());
        let last_snapshot = match already_saved {
            Some(paths) => {
                ::log::info!("Latest snapshot already holds all {} records", records.len());
                Some(paths)
            }
            None => self.flush(records.clone()).await,
        };

        self.fetcher.shutdown().await;
        self.set_phase(Phase::Done);

        let interrupted = self.interrupt.is_triggered();
        ::log::info!(
            "Run {} with {} product(s) collected",
            if interrupted { "interrupted" } else { "finished" },
            records.len()
        );

        RunSummary {
            records: records.len(),
            attempted: self.counters.attempted.load(Ordering::Relaxed),
            duplicates_skipped: self.counters.duplicates_skipped.load(Ordering::Relaxed),
            fetch_failures: self.counters.fetch_failures.load(Ordering::Relaxed),
            invalid_pages: self.counters.invalid_pages.load(Ordering::Relaxed),
            sites_processed: self.counters.sites_processed.load(Ordering::Relaxed),
            interrupted,
            last_snapshot,
        }
    }

    fn set_phase(&self, next: Phase) {
        let mut phase = lock(&self.phase);
        if *phase != next {
            ::log::trace!("Phase {:?} -> {:?}", *phase, next);
            *phase = next;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
