//! Page-rendering capabilities the category scraper drives.
//!
//! A [`PageFetcher`] behaves like a single browser tab: `navigate` loads a
//! URL, `wait_for_content_loaded` blocks until the DOM is ready, and
//! `extract` queries whatever page is currently loaded.

mod chrome;
mod http;
mod origin;

use async_trait::async_trait;

use crate::document::{Document, ElementSelector};
use crate::error::ScraperError;

pub use chrome::ChromePageFetcher;
pub use http::{HttpFetcherConfig, HttpPageFetcher};
pub use origin::{extract_domain, extract_origin};

/// What to pull out of the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Text of the first element matching a `tag.class` selector.
    ElementText(ElementSelector),
    /// Text content of the whole body.
    BodyText,
    /// Absolute `href`s of anchors whose `href` contains the given substring.
    LinkHrefs { href_contains: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Text(Option<String>),
    Links(Vec<String>),
}

impl Extraction {
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            Extraction::Text(text) => text,
            Extraction::Links(_) => None,
        }
    }

    #[must_use]
    pub fn into_links(self) -> Vec<String> {
        match self {
            Extraction::Links(links) => links,
            Extraction::Text(_) => Vec::new(),
        }
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Load `url`, replacing the current page.
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError>;

    /// Wait until the current page's DOM content is available.
    async fn wait_for_content_loaded(&mut self) -> Result<(), ScraperError>;

    /// Run `selector` against the current page.
    async fn extract(&self, selector: &Selector) -> Result<Extraction, ScraperError>;
}

/// Shared `extract` body for fetchers that hold a parsed [`Document`].
pub(crate) fn extract_from(
    page: Option<&Document>,
    selector: &Selector,
) -> Result<Extraction, ScraperError> {
    page.map(|doc| doc.extract(selector))
        .ok_or(ScraperError::NoPageLoaded)
}
