use crate::config::{DelayRange, HarvestConfig};
use crate::crawlers::crawler::{PageFetcher, ProductUrlSource};
use crate::error::{DiscoveryError, FetchError};
use crate::filter::{LinkFilter, LinkFilterConfig, LinkKind};
use crate::interrupt::Interrupt;
use crate::parsers::html::resolve_links;
use crate::utils::polite_pause;
use async_trait::async_trait;
use url::Url;

/// Links found on one storefront page, split by kind
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub products: Vec<String>,
    pub collections: Vec<String>,
}

/// Classify the anchors of a rendered page, keeping document order and dropping repeats
pub fn classify_links(html: &str, base: &Url, filter: &LinkFilter) -> PageLinks {
    let mut links = PageLinks::default();

    for url in resolve_links(html, base) {
        let Some(kind) = filter.classify(&url) else {
            continue;
        };
        let url = filter.normalize_url(&url).to_string();
        let bucket = match kind {
            LinkKind::Product => &mut links.products,
            LinkKind::Collection => &mut links.collections,
        };
        if !bucket.contains(&url) {
            bucket.push(url);
        }
    }

    links
}

/// Enumerates product pages of a storefront from its root and a few collection pages
pub struct UrlDiscoverer<F> {
    fetcher: F,
    max_collection_pages: usize,
    collection_delay: DelayRange,
    interrupt: Interrupt,
}

impl<F: PageFetcher> UrlDiscoverer<F> {
    pub fn new(fetcher: F, config: &HarvestConfig, interrupt: Interrupt) -> Self {
        Self {
            fetcher,
            max_collection_pages: config.max_collection_pages,
            collection_delay: config.collection_delay,
            interrupt,
        }
    }

    async fn load(&self, url: &str) -> Result<(Url, String), FetchError> {
        let doc = self.fetcher.fetch(url).await?;
        let base = Url::parse(&doc.final_url)
            .or_else(|_| Url::parse(url))
            .map_err(|e| FetchError::new(url, e))?;
        Ok((base, doc.html))
    }
}

#[async_trait]
impl<F: PageFetcher> ProductUrlSource for UrlDiscoverer<F> {
    async fn discover_product_urls(&self, site_root: &str) -> Vec<String> {
        let root = match Url::parse(site_root) {
            Ok(root) => root,
            Err(e) => {
                ::log::warn!("Cannot discover products under {}: {}", site_root, e);
                return Vec::new();
            }
        };

        let (base, html) = match self.load(site_root).await {
            Ok(page) => page,
            Err(e) => {
                ::log::warn!("{}", DiscoveryError::SiteRoot(e));
                return Vec::new();
            }
        };

        if base.host_str() != root.host_str() {
            ::log::debug!("{} redirected to {}", site_root, base);
        }
        let filter = match LinkFilter::new(LinkFilterConfig::for_redirected_site(&root, &base)) {
            Ok(filter) => filter,
            Err(e) => {
                ::log::warn!("Cannot discover products under {}: {}", site_root, e);
                return Vec::new();
            }
        };

        let root_links = classify_links(&html, &base, &filter);
        let mut products = root_links.products;
        ::log::debug!(
            "{}: {} product link(s), {} collection(s) on the root page",
            site_root,
            products.len(),
            root_links.collections.len()
        );

        for collection in root_links.collections.iter().take(self.max_collection_pages) {
            if self.interrupt.is_triggered() {
                break;
            }

            match self.load(collection).await {
                Ok((base, html)) => {
                    for url in classify_links(&html, &base, &filter).products {
                        if !products.contains(&url) {
                            products.push(url);
                        }
                    }
                }
                Err(e) => {
                    ::log::warn!("{}", DiscoveryError::CollectionPage(e));
                    continue;
                }
            }

            if !polite_pause(&self.collection_delay, &self.interrupt).await {
                break;
            }
        }

        ::log::info!("Found {} product URL(s) under {}", products.len(), site_root);
        products
    }
}
