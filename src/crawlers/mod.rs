pub mod collector;
pub mod crawler;
pub mod products;
pub mod sites;
pub mod web;

pub use collector::{Collector, Phase};
pub use crawler::{PageFetcher, ProductUrlSource, SiteSource};
pub use products::UrlDiscoverer;
pub use sites::SiteDiscoverer;
pub use web::Fetcher;
