pub mod app_config;
pub mod artifact;
pub mod categories;
pub mod config;
pub mod ids;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, RendererKind};
pub use artifact::{
    dataset_file_name, generated_at_now, read_json_artifact, write_json_artifact, ArtifactError,
    CategoryDataset, CategoryEntry, CategoryRegistry, CategoryStatistics, ConsolidatedIndex,
};
pub use categories::{
    load_categories, validate_listing, CategoriesFile, CategorySource, ListingProfile,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use ids::ProductIdSet;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read categories file {path}: {source}")]
    CategoriesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse categories file: {0}")]
    CategoriesFileParse(#[from] serde_yaml::Error),

    #[error("categories config validation failed: {0}")]
    Validation(String),
}
