pub mod category;
pub mod document;
pub mod error;
pub mod fetcher;
pub mod pagination;
pub(crate) mod rate_limit;
pub mod throttle;

pub use category::{CategoryScraper, ScrapeOutcome, StopReason};
pub use document::{Document, ElementSelector};
pub use error::ScraperError;
pub use fetcher::{
    ChromePageFetcher, Extraction, HttpFetcherConfig, HttpPageFetcher, PageFetcher, Selector,
};
pub use throttle::OriginThrottle;
