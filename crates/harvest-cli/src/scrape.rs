//! `harvest scrape`: walk category listings and write one dataset per category.
//!
//! Categories run concurrently up to `scraper_max_concurrent_categories`,
//! each with its own fetcher. One shared throttle keeps the politeness delay
//! per site no matter how many categories are in flight. A failed category
//! is logged and counted while the others still write their datasets; the
//! command fails if any category failed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use harvest_core::{load_categories, AppConfig, CategorySource, ListingProfile, RendererKind};
use harvest_scraper::{
    CategoryScraper, ChromePageFetcher, HttpFetcherConfig, HttpPageFetcher, OriginThrottle,
    PageFetcher, ScrapeOutcome, ScraperError,
};

type CategoryResult = Result<(ScrapeOutcome, PathBuf), ScraperError>;

/// Categories and listing profile for a run: explicit URLs use the default
/// profile unless a categories file is named; otherwise the configured
/// categories file supplies both.
pub(crate) fn resolve_targets(
    config: &AppConfig,
    urls: &[String],
    categories_path: Option<&Path>,
) -> anyhow::Result<(Vec<CategorySource>, ListingProfile)> {
    if !urls.is_empty() {
        let profile = match categories_path {
            Some(path) => load_categories(path)?.listing,
            None => ListingProfile::default(),
        };
        let sources = urls
            .iter()
            .map(|url| CategorySource {
                url: url.clone(),
                label: None,
            })
            .collect();
        return Ok((sources, profile));
    }

    let path = categories_path.unwrap_or(&config.categories_path);
    let file = load_categories(path).map_err(|e| {
        anyhow::anyhow!("no category URLs given and {} is unusable: {e}", path.display())
    })?;
    Ok((file.categories, file.listing))
}

pub(crate) async fn run_scrape(
    config: &AppConfig,
    urls: &[String],
    categories_path: Option<&Path>,
) -> anyhow::Result<()> {
    let (sources, profile) = resolve_targets(config, urls, categories_path)?;

    if config.scraper_request_timeout_secs.is_none() {
        tracing::warn!(
            "HARVEST_SCRAPER_REQUEST_TIMEOUT_SECS is not set; page requests have no overall timeout"
        );
    }

    let throttle = Arc::new(OriginThrottle::new(
        Duration::from_millis(config.scraper_page_delay_ms),
        Duration::from_millis(config.scraper_page_jitter_ms),
    ));
    let output_dir = config.dataset_dir.as_path();

    tracing::info!(
        categories = sources.len(),
        renderer = %config.scraper_renderer,
        output_dir = %output_dir.display(),
        "starting scrape"
    );

    let results = match config.scraper_renderer {
        RendererKind::Http => {
            let base = HttpPageFetcher::new(&HttpFetcherConfig {
                timeout_secs: config.scraper_request_timeout_secs,
                user_agent: config.scraper_user_agent.clone(),
                max_retries: config.scraper_max_retries,
                backoff_base_secs: config.scraper_retry_backoff_base_secs,
            })?;
            scrape_all(config, &sources, &profile, &throttle, output_dir, || {
                base.new_tab()
            })
            .await
        }
        RendererKind::Chrome => {
            let base = ChromePageFetcher::new(
                &config.chrome_bin,
                &config.scraper_user_agent,
                config.scraper_request_timeout_secs,
            );
            scrape_all(config, &sources, &profile, &throttle, output_dir, || {
                base.new_tab()
            })
            .await
        }
    };

    report(&sources, &results)
}

async fn scrape_all<F, M>(
    config: &AppConfig,
    sources: &[CategorySource],
    profile: &ListingProfile,
    throttle: &Arc<OriginThrottle>,
    output_dir: &Path,
    make_fetcher: M,
) -> Vec<CategoryResult>
where
    F: PageFetcher,
    M: Fn() -> F,
{
    let max_concurrent = config.scraper_max_concurrent_categories.max(1);

    let mut indexed: Vec<(usize, CategoryResult)> = stream::iter(sources.iter().enumerate())
        .map(|(i, source)| {
            let scraper = CategoryScraper::new(
                make_fetcher(),
                Arc::clone(throttle),
                profile.clone(),
                config.scraper_max_pages,
            );
            async move {
                let result = match scraper {
                    Ok(mut scraper) => scraper.scrape_to_dir(&source.url, output_dir).await,
                    Err(e) => Err(e),
                };
                (i, result)
            }
        })
        .buffer_unordered(max_concurrent)
        .collect()
        .await;

    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, result)| result).collect()
}

pub(crate) fn report(sources: &[CategorySource], results: &[CategoryResult]) -> anyhow::Result<()> {
    let mut failed = 0usize;
    for (source, result) in sources.iter().zip(results) {
        let label = source.label.as_deref().unwrap_or(&source.url);
        match result {
            Ok((outcome, path)) => println!(
                "{label}: {} products in \"{}\" over {} page(s), {} -> {}",
                outcome.dataset.product_ids.len(),
                outcome.dataset.category_name,
                outcome.pages_fetched,
                outcome.stop,
                path.display()
            ),
            Err(e) => {
                failed += 1;
                tracing::error!(category = label, error = %e, "category failed");
                println!("{label}: FAILED ({e})");
            }
        }
    }

    let succeeded = results.len() - failed;
    println!("scrape complete: {succeeded} succeeded, {failed} failed");

    if failed > 0 {
        anyhow::bail!("{failed} of {} categories failed", results.len());
    }
    Ok(())
}
