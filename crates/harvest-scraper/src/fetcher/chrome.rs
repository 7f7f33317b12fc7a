//! Page fetcher backed by an external headless Chromium process.
//!
//! Each navigation runs `chromium --headless --dump-dom <url>` in a throwaway
//! profile directory and parses the serialized DOM it prints. Script
//! execution happens entirely inside the browser.

use std::time::Duration;

use async_trait::async_trait;

use super::{extract_from, Extraction, PageFetcher, Selector};
use crate::document::Document;
use crate::error::ScraperError;
use crate::pagination::validate_category_url;

#[derive(Debug, Clone)]
pub struct ChromePageFetcher {
    chrome_bin: String,
    user_agent: String,
    timeout: Option<Duration>,
    page: Option<Document>,
}

impl ChromePageFetcher {
    #[must_use]
    pub fn new(chrome_bin: &str, user_agent: &str, timeout_secs: Option<u64>) -> Self {
        Self {
            chrome_bin: chrome_bin.to_owned(),
            user_agent: user_agent.to_owned(),
            timeout: timeout_secs.map(Duration::from_secs),
            page: None,
        }
    }

    #[must_use]
    pub fn new_tab(&self) -> Self {
        Self {
            page: None,
            ..self.clone()
        }
    }

    async fn dump_dom(&self, url: &str) -> Result<String, ScraperError> {
        let renderer_err = |reason: String| ScraperError::Renderer {
            url: url.to_owned(),
            reason,
        };

        let profile_dir = tempfile::tempdir()
            .map_err(|e| renderer_err(format!("failed to create profile dir: {e}")))?;

        let mut command = tokio::process::Command::new(&self.chrome_bin);
        command
            .args([
                "--headless",
                "--no-sandbox",
                "--disable-gpu",
                "--disable-dev-shm-usage",
                "--lang=en-US",
            ])
            .arg(format!("--user-agent={}", self.user_agent))
            .arg(format!("--user-data-dir={}", profile_dir.path().display()))
            .arg("--dump-dom")
            .arg(url)
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| renderer_err(format!("timed out after {}s", limit.as_secs())))?,
            None => command.output().await,
        }
        .map_err(|e| renderer_err(format!("failed to launch {}: {e}", self.chrome_bin)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(renderer_err(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(renderer_err("empty DOM output".to_owned()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl PageFetcher for ChromePageFetcher {
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        validate_category_url(url)?;
        self.page = None;
        let html = self.dump_dom(url).await?;
        tracing::debug!(url, bytes = html.len(), renderer = "chrome", "page rendered");
        self.page = Some(Document::parse(html, url));
        Ok(())
    }

    /// `--dump-dom` prints the DOM only after the load event, so a rendered
    /// page is already complete.
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
