use harvest_core::ArtifactError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid category URL \"{url}\": {reason}")]
    InvalidCategoryUrl { url: String, reason: String },

    #[error("could not extract category title from {url}")]
    MissingCategoryTitle { url: String },

    #[error("invalid listing profile: {0}")]
    InvalidListingProfile(String),

    #[error("no page has been loaded; call navigate first")]
    NoPageLoaded,

    #[error("renderer failed for {url}: {reason}")]
    Renderer { url: String, reason: String },

    #[error("failed to write category dataset: {0}")]
    Artifact(#[from] ArtifactError),
}
