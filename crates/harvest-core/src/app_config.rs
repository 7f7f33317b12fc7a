use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which page-rendering capability backs the category scraper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    /// Static HTML fetched over HTTP.
    Http,
    /// External headless Chromium dumping the rendered DOM.
    Chrome,
}

impl std::fmt::Display for RendererKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RendererKind::Http => write!(f, "http"),
            RendererKind::Chrome => write!(f, "chrome"),
        }
    }
}

impl std::str::FromStr for RendererKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(RendererKind::Http),
            "chrome" => Ok(RendererKind::Chrome),
            other => Err(format!(
                "unknown renderer '{other}'; expected 'http' or 'chrome'"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub categories_path: PathBuf,
    pub dataset_dir: PathBuf,
    pub consolidated_path: PathBuf,
    pub registry_path: PathBuf,
    pub products_input_path: PathBuf,
    pub products_output_path: PathBuf,
    /// Per-request timeout. `None` leaves requests unbounded.
    pub scraper_request_timeout_secs: Option<u64>,
    pub scraper_user_agent: String,
    pub scraper_page_delay_ms: u64,
    pub scraper_page_jitter_ms: u64,
    pub scraper_max_pages: usize,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_secs: u64,
    pub scraper_max_concurrent_categories: usize,
    pub scraper_renderer: RendererKind,
    pub chrome_bin: String,
    pub enrich_program: String,
    pub enrich_args: Vec<String>,
    pub enrich_batch_delay_ms: u64,
}
