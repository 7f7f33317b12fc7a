//! Paginated category scraper.
//!
//! Per category the scraper runs
//! `FetchPage → Extract → {Continue | EndOfListing | NoResults | FetchError}`
//! until a terminal state is reached:
//!
//! 1. Page 1 is the category URL; later pages add the page parameter.
//! 2. Page 1 must yield the category title, otherwise the category is
//!    rejected and nothing is written.
//! 3. The end-of-listing sentinel in the body stops pagination normally.
//! 4. A page with no product links stops pagination (some listings never
//!    show the sentinel).
//! 5. Any fetch or extraction failure after the title is known stops
//!    pagination but keeps every id collected so far. Failed pages are not
//!    retried here.
//!
//! Page fetches are strictly sequential and go through an
//! [`OriginThrottle`], which enforces the politeness delay.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use harvest_core::{
    dataset_file_name, validate_listing, write_json_artifact, CategoryDataset, ListingProfile,
    ProductIdSet,
};
use regex::Regex;

use crate::document::ElementSelector;
use crate::error::ScraperError;
use crate::fetcher::{PageFetcher, Selector};
use crate::pagination::{page_url, validate_category_url};
use crate::throttle::OriginThrottle;

/// Why pagination stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The end-of-listing sentinel appeared on `page`.
    EndOfListing { page: usize },
    /// `page` contained no product links.
    NoResults { page: usize },
    /// Fetching or extracting `page` failed; earlier pages are kept.
    FetchError { page: usize, message: String },
    /// The page guard was hit before the listing ended.
    PageLimit { max_pages: usize },
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::EndOfListing { page } => write!(f, "end of listing at page {page}"),
            StopReason::NoResults { page } => write!(f, "no products on page {page}"),
            StopReason::FetchError { page, message } => {
                write!(f, "error on page {page}: {message}")
            }
            StopReason::PageLimit { max_pages } => write!(f, "page limit of {max_pages} reached"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub dataset: CategoryDataset,
    /// Number of page fetches issued, including the terminal one.
    pub pages_fetched: usize,
    pub stop: StopReason,
}

enum PageStep {
    EndOfListing,
    NoResults,
    Products(ProductIdSet),
}

pub struct CategoryScraper<F: PageFetcher> {
    fetcher: F,
    throttle: Arc<OriginThrottle>,
    profile: ListingProfile,
    title_selector: ElementSelector,
    id_pattern: Regex,
    max_pages: usize,
}

impl<F: PageFetcher> CategoryScraper<F> {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidListingProfile`] if the profile's id
    /// pattern or title selector is unusable, or `max_pages` is zero.
    pub fn new(
        fetcher: F,
        throttle: Arc<OriginThrottle>,
        profile: ListingProfile,
        max_pages: usize,
    ) -> Result<Self, ScraperError> {
        validate_listing(&profile)
            .map_err(|e| ScraperError::InvalidListingProfile(e.to_string()))?;
        let title_selector = profile
            .title_selector
            .parse::<ElementSelector>()
            .map_err(ScraperError::InvalidListingProfile)?;
        let id_pattern = Regex::new(&profile.product_id_pattern)
            .map_err(|e| ScraperError::InvalidListingProfile(e.to_string()))?;
        if max_pages == 0 {
            return Err(ScraperError::InvalidListingProfile(
                "max_pages must be at least 1".to_owned(),
            ));
        }

        Ok(Self {
            fetcher,
            throttle,
            profile,
            title_selector,
            id_pattern,
            max_pages,
        })
    }

    /// Walks the listing at `base_url` and returns the collected dataset.
    ///
    /// # Errors
    ///
    /// Returns an error only when no dataset can be produced: the URL is
    /// invalid, page 1 could not be fetched, or page 1 has no category title.
    /// Failures on later pages end pagination and are reported through
    /// [`StopReason::FetchError`].
    pub async fn scrape(&mut self, base_url: &str) -> Result<ScrapeOutcome, ScraperError> {
        validate_category_url(base_url)?;
        tracing::info!(url = base_url, "starting category scrape");

        let mut category_name: Option<String> = None;
        let mut accumulated = ProductIdSet::new();
        let mut pages_fetched = 0usize;
        let mut page = 1usize;

        let stop = loop {
            if page > self.max_pages {
                tracing::warn!(
                    url = base_url,
                    max_pages = self.max_pages,
                    "page limit reached before end of listing"
                );
                break StopReason::PageLimit {
                    max_pages: self.max_pages,
                };
            }

            let url = page_url(base_url, page, &self.profile.page_param)?;
            tracing::info!(page, url = %url, "scraping page");
            pages_fetched += 1;

            match self.visit(&url, page, &mut category_name).await {
                Ok(PageStep::EndOfListing) => {
                    tracing::info!(page, "reached end page (sentinel found)");
                    break StopReason::EndOfListing { page };
                }
                Ok(PageStep::NoResults) => {
                    tracing::info!(page, "reached end page (no products found)");
                    break StopReason::NoResults { page };
                }
                Ok(PageStep::Products(ids)) => {
                    let added = accumulated.merge(&ids);
                    tracing::info!(
                        page,
                        on_page = ids.len(),
                        new = added,
                        total = accumulated.len(),
                        "collected product ids"
                    );
                    page += 1;
                }
                Err(err) if category_name.is_none() => return Err(err),
                Err(err) => {
                    tracing::error!(page, error = %err, "page failed, keeping ids collected so far");
                    break StopReason::FetchError {
                        page,
                        message: err.to_string(),
                    };
                }
            }
        };

        let Some(category_name) = category_name else {
            return Err(ScraperError::MissingCategoryTitle {
                url: base_url.to_owned(),
            });
        };

        let dataset = CategoryDataset::from_set(category_name, &accumulated);
        tracing::info!(
            category = %dataset.category_name,
            products = dataset.product_ids.len(),
            pages_fetched,
            stop = %stop,
            "category scrape complete"
        );

        Ok(ScrapeOutcome {
            dataset,
            pages_fetched,
            stop,
        })
    }

    /// Scrapes `base_url` and writes the dataset into `output_dir` as
    /// `<category_name>_products.json`. Partial results are written too.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::scrape`] errors, plus [`ScraperError::Artifact`] if
    /// the file cannot be written.
    pub async fn scrape_to_dir(
        &mut self,
        base_url: &str,
        output_dir: &Path,
    ) -> Result<(ScrapeOutcome, PathBuf), ScraperError> {
        let outcome = self.scrape(base_url).await?;
        let path = output_dir.join(dataset_file_name(&outcome.dataset.category_name));
        write_json_artifact(&path, &outcome.dataset)?;
        tracing::info!(path = %path.display(), "category dataset saved");
        Ok((outcome, path))
    }

    async fn visit(
        &mut self,
        url: &str,
        page: usize,
        category_name: &mut Option<String>,
    ) -> Result<PageStep, ScraperError> {
        self.throttle.acquire(url).await;
        let loaded = self.load(url).await;
        self.throttle.complete(url);
        loaded?;

        if page == 1 {
            let title = self
                .fetcher
                .extract(&Selector::ElementText(self.title_selector.clone()))
                .await?
                .into_text()
                .ok_or_else(|| ScraperError::MissingCategoryTitle {
                    url: url.to_owned(),
                })?;
            tracing::info!(category = %title, "category name");
            *category_name = Some(title);
        }

        let body = self
            .fetcher
            .extract(&Selector::BodyText)
            .await?
            .into_text()
            .unwrap_or_default();
        if body.contains(&self.profile.end_sentinel) {
            return Ok(PageStep::EndOfListing);
        }

        let links = self
            .fetcher
            .extract(&Selector::LinkHrefs {
                href_contains: self.profile.product_link_marker.clone(),
            })
            .await?
            .into_links();
        let ids = self.parse_ids(&links);

        if ids.is_empty() {
            Ok(PageStep::NoResults)
        } else {
            Ok(PageStep::Products(ids))
        }
    }

    async fn load(&mut self, url: &str) -> Result<(), ScraperError> {
        self.fetcher.navigate(url).await?;
        self.fetcher.wait_for_content_loaded().await
    }

    /// Unique ids on one page; links whose id does not fit in `u64` are dropped.
    fn parse_ids(&self, links: &[String]) -> ProductIdSet {
        links
            .iter()
            .filter_map(|href| {
                let raw = self.id_pattern.captures(href)?.get(1)?.as_str();
                match raw.parse::<u64>() {
                    Ok(id) => Some(id),
                    Err(e) => {
                        tracing::debug!(href = %href, error = %e, "ignoring unparseable product id");
                        None
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "category_test.rs"]
mod tests;
