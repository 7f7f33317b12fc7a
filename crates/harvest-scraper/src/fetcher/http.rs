//! Static-HTML page fetcher over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{extract_domain, extract_from, Extraction, PageFetcher, Selector};
use crate::document::Document;
use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Whole-request timeout. `None` applies no overall limit.
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
    /// Additional attempts after the first failure for 429 / network / 5xx.
    pub max_retries: u32,
    /// Base delay for exponential backoff: `backoff_base_secs * 2^attempt`.
    pub backoff_base_secs: u64,
}

/// Fetches listing pages as plain HTML. Pages that only render their product
/// grid through scripts need [`super::ChromePageFetcher`] instead.
///
/// Handles rate limiting (429), not-found (404), and other non-2xx responses
/// as typed errors.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
    page: Option<Document>,
}

impl HttpPageFetcher {
    /// Creates a fetcher with the configured timeout, `User-Agent`, and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(config: &HttpFetcherConfig) -> Result<Self, ScraperError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.as_str());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            max_retries: config.max_retries,
            backoff_base_secs: config.backoff_base_secs,
            page: None,
        })
    }

    /// A fresh tab sharing this fetcher's connection pool and settings.
    #[must_use]
    pub fn new_tab(&self) -> Self {
        Self {
            client: self.client.clone(),
            max_retries: self.max_retries,
            backoff_base_secs: self.backoff_base_secs,
            page: None,
        }
    }

    async fn fetch_html(&self, url: &str) -> Result<String, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.to_owned();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .header(
                        reqwest::header::ACCEPT,
                        "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
                    )
                    .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ScraperError::RateLimited {
                        domain: extract_domain(&url),
                        retry_after_secs,
                    });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ScraperError::NotFound { url });
                }

                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                Ok(response.text().await?)
            }
        })
        .await
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        self.page = None;
        let html = self.fetch_html(url).await?;
        tracing::debug!(url, bytes = html.len(), "page fetched");
        self.page = Some(Document::parse(html, url));
        Ok(())
    }

    /// The whole body has been read by the time `navigate` returns, so this
    /// only checks that a page is loaded.
    async fn wait_for_content_loaded(&mut self) -> Result<(), ScraperError> {
        if self.page.is_some() {
            Ok(())
        } else {
            Err(ScraperError::NoPageLoaded)
        }
    }

    async fn extract(&self, selector: &Selector) -> Result<Extraction, ScraperError> {
        extract_from(self.page.as_ref(), selector)
    }
}
