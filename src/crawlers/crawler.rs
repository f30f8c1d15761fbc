use crate::error::FetchError;
use crate::results::RenderedDocument;
use async_trait::async_trait;

/// Loads a page through a rendering engine
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Load `url` and return the rendered document.
    ///
    /// Implementations must give up after a bounded wait and never retry.
    async fn fetch(&self, url: &str) -> Result<RenderedDocument, FetchError>;

    /// Release the rendering engine
    async fn shutdown(&self) {}
}

/// Produces candidate storefront origins for a set of keywords
#[async_trait]
pub trait SiteSource: Send + Sync {
    async fn discover_sites(&self, keywords: &[String]) -> Vec<String>;
}

/// Enumerates product-detail URLs under a storefront origin
#[async_trait]
pub trait ProductUrlSource: Send + Sync {
    async fn discover_product_urls(&self, site_root: &str) -> Vec<String>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for std::sync::Arc<T> {
    async fn fetch(&self, url: &str) -> Result<RenderedDocument, FetchError> {
        (**self).fetch(url).await
    }

    async fn shutdown(&self) {
        (**self).shutdown().await
    }
}
