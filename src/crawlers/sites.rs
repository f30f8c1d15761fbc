use crate::config::{DelayRange, HarvestConfig};
use crate::crawlers::crawler::SiteSource;
use crate::error::DiscoveryError;
use crate::filter::{StorefrontFilter, unwrap_search_link};
use crate::interrupt::Interrupt;
use crate::parsers::html::parse_links;
use crate::utils::{origin_of, polite_pause, random_user_agent};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use std::time::Duration;
use url::Url;

/// Finds storefront origins by querying a search page for each keyword
pub struct SiteDiscoverer {
    client: Client,
    search_url: String,
    filter: StorefrontFilter,
    seed_sites: Vec<String>,
    keyword_delay: DelayRange,
    interrupt: Interrupt,
}

impl SiteDiscoverer {
    pub fn new(config: &HarvestConfig, interrupt: Interrupt) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            search_url: config.search_url.clone(),
            filter: StorefrontFilter::new(&config.storefront_suffix, &config.known_storefronts),
            seed_sites: config.seed_sites.clone(),
            keyword_delay: config.keyword_delay,
            interrupt,
        })
    }

    /// Search URL for a keyword
    pub fn search_url_for(&self, keyword: &str) -> String {
        let query = url::form_urlencoded::byte_serialize(keyword.as_bytes()).collect::<String>();
        // Keywords already written as `a+b` keep their plus signs as spaces.
        let query = query.replace("%2B", "+");
        self.search_url.replace("{query}", &query)
    }

    /// Fetch one search page with a rotated identity
    async fn search(&self, keyword: &str) -> Result<(Url, String), DiscoveryError> {
        let url = self.search_url_for(keyword);
        let err = |cause: String| DiscoveryError::Search {
            keyword: keyword.to_string(),
            cause,
        };
        let page = Url::parse(&url).map_err(|e| err(e.to_string()))?;

        let body = self
            .client
            .get(page.clone())
            .header(USER_AGENT, random_user_agent())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| err(e.to_string()))?
            .text()
            .await
            .map_err(|e| err(e.to_string()))?;

        Ok((page, body))
    }
}

/// Storefront origins linked from a search results page, in order of first appearance
pub fn storefronts_in_results(html: &str, page: &Url, filter: &StorefrontFilter) -> Vec<String> {
    let search_host = page.host_str().unwrap_or_default().to_string();
    let mut origins: Vec<String> = Vec::new();

    for href in parse_links(html) {
        let Some(target) = unwrap_search_link(&href, page) else {
            continue;
        };
        if target.host_str() == Some(search_host.as_str()) || !filter.is_storefront(&target) {
            continue;
        }
        if let Some(origin) = origin_of(&target) {
            push_unique(&mut origins, origin);
        }
    }

    origins
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}

#[async_trait]
impl SiteSource for SiteDiscoverer {
    async fn discover_sites(&self, keywords: &[String]) -> Vec<String> {
        let mut sites: Vec<String> = Vec::new();

        for seed in &self.seed_sites {
            match Url::parse(seed).ok().as_ref().and_then(origin_of) {
                Some(origin) => push_unique(&mut sites, origin),
                None => ::log::warn!("Ignoring invalid seed site: {}", seed),
            }
        }

        for (i, keyword) in keywords.iter().enumerate() {
            if self.interrupt.is_triggered() {
                break;
            }

            match self.search(keyword).await {
                Ok((page, body)) => {
                    let found = storefronts_in_results(&body, &page, &self.filter);
                    ::log::info!("Keyword '{}' yielded {} storefront(s)", keyword, found.len());
                    for origin in found {
                        push_unique(&mut sites, origin);
                    }
                }
                Err(e) => ::log::warn!("{}", e),
            }

            if i + 1 < keywords.len() && !polite_pause(&self.keyword_delay, &self.interrupt).await {
                break;
            }
        }

        sites
    }
}
