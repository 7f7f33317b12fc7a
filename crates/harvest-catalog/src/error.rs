use std::path::PathBuf;

use harvest_core::ArtifactError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read dataset directory {path}: {source}")]
    InputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no valid category datasets in {path} ({skipped} file(s) skipped)")]
    NoValidDatasets { path: PathBuf, skipped: usize },

    #[error("raw product catalog must be a JSON array of records: {0}")]
    InvalidCatalog(String),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("no product ids to process")]
    EmptyWorklist,

    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("batch {batch}/{total} failed: {reason}; remaining batches were not started")]
    Aborted {
        batch: usize,
        total: usize,
        reason: String,
    },
}

/// Why a dataset file was left out of consolidation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetRejection {
    #[error("unreadable: {0}")]
    Unreadable(String),

    #[error("not valid JSON: {0}")]
    Syntax(String),

    #[error("top level is not an object")]
    NotAnObject,

    #[error("category_name is missing or not a non-empty string")]
    BadCategoryName,

    #[error("product_ids is missing or not an array")]
    BadProductIds,

    #[error("product_ids[{index}] is not a non-negative integer")]
    BadProductId { index: usize },
}
