use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for classifying links found on storefront pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkFilterConfig {
    /// Domain restriction (if None, links on any host are accepted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_domain: Option<String>,

    /// Further hosts accepted alongside `required_domain`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alias_domains: Vec<String>,

    /// Regex patterns identifying product-detail pages
    #[serde(default = "default_product_patterns")]
    pub product_patterns: Vec<String>,

    /// Regex patterns identifying collection/category pages
    #[serde(default = "default_collection_patterns")]
    pub collection_patterns: Vec<String>,

    /// Regex patterns for URLs to ignore (these take precedence)
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
}

fn default_product_patterns() -> Vec<String> {
    vec![r"/products?/[^/?#]+".to_string()]
}

fn default_collection_patterns() -> Vec<String> {
    vec![r"/collections/[^/?#]+".to_string()]
}

fn default_exclude_patterns() -> Vec<String> {
    vec![r"\.(jpg|jpeg|png|gif|webp|css|js|ico|svg|woff|woff2|ttf|eot|pdf)$".to_string()]
}

impl Default for LinkFilterConfig {
    fn default() -> Self {
        Self {
            required_domain: None,
            alias_domains: Vec::new(),
            product_patterns: default_product_patterns(),
            collection_patterns: default_collection_patterns(),
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

impl LinkFilterConfig {
    /// Default patterns, restricted to the host of `root`
    pub fn for_site(root: &Url) -> Self {
        Self {
            required_domain: root.host_str().map(|h| h.to_string()),
            ..Self::default()
        }
    }

    /// Default patterns for a site whose root redirected to `landed`.
    ///
    /// Links on the landed host are followed, as are links back to the requested host.
    pub fn for_redirected_site(root: &Url, landed: &Url) -> Self {
        let mut config = Self::for_site(landed);
        if let Some(host) = root.host_str() {
            if config.required_domain.as_deref() != Some(host) {
                config.alias_domains.push(host.to_string());
            }
        }
        config
    }
}

/// Kind of page a link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Product,
    Collection,
}

/// Regex-based classifier deciding which storefront links are worth following
#[derive(Debug)]
pub struct LinkFilter {
    config: LinkFilterConfig,
    product_regexes: Vec<Regex>,
    collection_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl LinkFilter {
    /// Create a new link filter from configuration
    pub fn new(config: LinkFilterConfig) -> Result<Self, regex::Error> {
        let product_regexes = compile(&config.product_patterns)?;
        let collection_regexes = compile(&config.collection_patterns)?;
        let exclude_regexes = compile(&config.exclude_patterns)?;

        Ok(Self {
            config,
            product_regexes,
            collection_regexes,
            exclude_regexes,
        })
    }

    /// Classify an absolute URL, or `None` if it should not be followed
    pub fn classify(&self, url: &Url) -> Option<LinkKind> {
        if !matches!(url.scheme(), "http" | "https") || !self.is_in_domain_scope(url) {
            return None;
        }

        let path = url.path();
        if self.exclude_regexes.iter().any(|r| r.is_match(path)) {
            return None;
        }

        // Collection-scoped product links (/collections/x/products/y) are products.
        if self.product_regexes.iter().any(|r| r.is_match(path)) {
            Some(LinkKind::Product)
        } else if self.collection_regexes.iter().any(|r| r.is_match(path)) {
            Some(LinkKind::Collection)
        } else {
            None
        }
    }

    fn is_in_domain_scope(&self, url: &Url) -> bool {
        match &self.config.required_domain {
            Some(required) => url.host_str().is_some_and(|host| {
                host == required || self.config.alias_domains.iter().any(|a| a == host)
            }),
            None => true,
        }
    }

    /// Create a normalized version of the URL (fragment removed)
    pub fn normalize_url(&self, url: &Url) -> Url {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        normalized
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|p| Regex::new(p)).collect()
}

/// Decides which search-result links point at storefronts
#[derive(Debug, Clone)]
pub struct StorefrontFilter {
    /// Domain suffix shared by hosted storefronts (e.g. `myshopify.com`)
    pub hosting_suffix: String,
    /// Independently-domained storefronts that are also accepted
    pub known_domains: Vec<String>,
}

impl StorefrontFilter {
    pub fn new(hosting_suffix: &str, known_domains: &[String]) -> Self {
        Self {
            hosting_suffix: hosting_suffix.to_ascii_lowercase(),
            known_domains: known_domains
                .iter()
                .map(|d| d.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Check whether a destination URL belongs to a storefront
    pub fn is_storefront(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();

        domain_matches(&host, &self.hosting_suffix)
            || self.known_domains.iter().any(|d| domain_matches(&host, d))
    }
}

fn domain_matches(host: &str, domain: &str) -> bool {
    !domain.is_empty()
        && (host == domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.')))
}

/// Resolve a search-result href against the search page, unwrapping redirect wrappers.
///
/// Wrappers look like `/url?q=<destination>&sa=...`; the destination is returned
/// instead of the wrapper itself.
pub fn unwrap_search_link(href: &str, search_page: &Url) -> Option<Url> {
    let resolved = search_page.join(href).ok()?;

    if resolved.path() == "/url" {
        let target = resolved
            .query_pairs()
            .find(|(k, _)| k == "q" || k == "url")
            .map(|(_, v)| v.into_owned())?;
        return Url::parse(&target).ok();
    }

    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site_filter() -> LinkFilter {
        let root = Url::parse("https://shop.example.com/").unwrap();
        LinkFilter::new(LinkFilterConfig::for_site(&root)).unwrap()
    }

    #[test]
    fn test_product_and_collection_classification() {
        let filter = site_filter();

        let product = Url::parse("https://shop.example.com/products/blue-shirt").unwrap();
        assert_eq!(filter.classify(&product), Some(LinkKind::Product));

        let singular = Url::parse("https://shop.example.com/product/mug?variant=1").unwrap();
        assert_eq!(filter.classify(&singular), Some(LinkKind::Product));

        let nested = Url::parse("https://shop.example.com/collections/tops/products/tee").unwrap();
        assert_eq!(filter.classify(&nested), Some(LinkKind::Product));

        let collection = Url::parse("https://shop.example.com/collections/tops").unwrap();
        assert_eq!(filter.classify(&collection), Some(LinkKind::Collection));

        let other = Url::parse("https://shop.example.com/pages/about").unwrap();
        assert_eq!(filter.classify(&other), None);

        let listing = Url::parse("https://shop.example.com/products/").unwrap();
        assert_eq!(filter.classify(&listing), None);
    }

    #[test]
    fn test_domain_restriction() {
        let filter = site_filter();
        let foreign = Url::parse("https://other.example.com/products/blue-shirt").unwrap();
        assert_eq!(filter.classify(&foreign), None);

        let unrestricted = LinkFilter::new(LinkFilterConfig::default()).unwrap();
        assert_eq!(unrestricted.classify(&foreign), Some(LinkKind::Product));
    }

    #[test]
    fn test_redirected_site_accepts_both_hosts() {
        let root = Url::parse("https://fitgear.myshopify.com/").unwrap();
        let landed = Url::parse("https://fitgear.com/").unwrap();
        let config = LinkFilterConfig::for_redirected_site(&root, &landed);
        assert_eq!(config.required_domain.as_deref(), Some("fitgear.com"));
        assert_eq!(config.alias_domains, vec!["fitgear.myshopify.com"]);

        let filter = LinkFilter::new(config).unwrap();
        let primary = Url::parse("https://fitgear.com/products/band").unwrap();
        let hosted = Url::parse("https://fitgear.myshopify.com/products/band").unwrap();
        let foreign = Url::parse("https://other.com/products/band").unwrap();
        assert_eq!(filter.classify(&primary), Some(LinkKind::Product));
        assert_eq!(filter.classify(&hosted), Some(LinkKind::Product));
        assert_eq!(filter.classify(&foreign), None);

        let same = LinkFilterConfig::for_redirected_site(&root, &root);
        assert!(same.alias_domains.is_empty());
    }

    #[test]
    fn test_assets_are_excluded() {
        let filter = site_filter();
        let image = Url::parse("https://shop.example.com/products/shirt.jpg").unwrap();
        assert_eq!(filter.classify(&image), None);

        let mailto = Url::parse("mailto:sales@shop.example.com").unwrap();
        assert_eq!(filter.classify(&mailto), None);
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let config = LinkFilterConfig {
            product_patterns: vec!["(".to_string()],
            ..LinkFilterConfig::default()
        };
        assert!(LinkFilter::new(config).is_err());
    }

    #[test]
    fn test_normalize_strips_fragment() {
        let filter = site_filter();
        let url = Url::parse("https://shop.example.com/products/a#reviews").unwrap();
        assert_eq!(
            filter.normalize_url(&url).as_str(),
            "https://shop.example.com/products/a"
        );
    }

    #[test]
    fn test_storefront_filter() {
        let filter = StorefrontFilter::new("myshopify.com", &["allbirds.com".to_string()]);

        let hosted = Url::parse("https://cool-store.myshopify.com/").unwrap();
        assert!(filter.is_storefront(&hosted));

        let known = Url::parse("https://www.allbirds.com/products/runner").unwrap();
        assert!(filter.is_storefront(&known));

        let lookalike = Url::parse("https://notallbirds.com/").unwrap();
        assert!(!filter.is_storefront(&lookalike));

        let unrelated = Url::parse("https://www.google.com/search?q=x").unwrap();
        assert!(!filter.is_storefront(&unrelated));
    }

    #[test]
    fn test_unwrap_search_link() {
        let page = Url::parse("https://www.google.com/search?q=fitness").unwrap();

        let wrapped = "/url?q=https://fit-gear.myshopify.com/products/band&sa=U&ved=abc";
        assert_eq!(
            unwrap_search_link(wrapped, &page).unwrap().as_str(),
            "https://fit-gear.myshopify.com/products/band"
        );

        let encoded = "/url?q=https%3A%2F%2Fa.myshopify.com%2F%3Fref%3D1&sa=U";
        assert_eq!(
            unwrap_search_link(encoded, &page).unwrap().as_str(),
            "https://a.myshopify.com/?ref=1"
        );

        let direct = "https://b.myshopify.com/collections/all";
        assert_eq!(
            unwrap_search_link(direct, &page).unwrap().as_str(),
            "https://b.myshopify.com/collections/all"
        );

        assert!(unwrap_search_link("/url?sa=U", &page).is_none());
    }
}
