//! Typed JSON artifacts exchanged between pipeline stages.
//!
//! Every stage reads its inputs from disk and writes its outputs to disk;
//! these files are the checkpoint boundary that lets a later stage be rerun
//! without repeating the network scrape.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::ProductIdSet;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize artifact for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result of scraping one category listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDataset {
    pub category_name: String,
    /// Ascending, no duplicates.
    pub product_ids: Vec<u64>,
}

impl CategoryDataset {
    #[must_use]
    pub fn from_set(category_name: impl Into<String>, ids: &ProductIdSet) -> Self {
        Self {
            category_name: category_name.into(),
            product_ids: ids.to_sorted_vec(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStatistics {
    pub total_products: usize,
    pub total_categories: usize,
    pub category_product_counts: BTreeMap<String, usize>,
    pub products_in_multiple_categories: usize,
    pub max_categories_per_product: usize,
}

/// Inverted index: product id → alphabetically sorted category names.
///
/// Keys serialize as decimal strings in ascending numeric order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedIndex {
    pub products: BTreeMap<u64, Vec<String>>,
    pub statistics: CategoryStatistics,
    pub generated_at: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRegistry {
    /// Sorted by `id`.
    pub categories: Vec<CategoryEntry>,
    pub generated_at: String,
    pub description: String,
}

/// Current UTC time as RFC 3339 with millisecond precision, e.g.
/// `2026-10-18T09:14:03.512Z`.
#[must_use]
pub fn generated_at_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// File name for a category's dataset: `<category_name>_products.json`.
///
/// Path separators and control characters in the name become `_` so a
/// category title can never escape the output directory.
#[must_use]
pub fn dataset_file_name(category_name: &str) -> String {
    let safe: String = category_name
        .chars()
        .map(|c| {
            if matches!(c, '/' | '\\') || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let safe = match safe.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => safe,
    };
    format!("{safe}_products.json")
}

/// Write `value` as pretty-printed JSON to `path`.
///
/// The bytes go to a sibling `.tmp` file first, which is then renamed over
/// `path`. Missing parent directories are created.
///
/// # Errors
///
/// Returns [`ArtifactError::Serialize`] if `value` cannot be encoded, or
/// [`ArtifactError::Io`] if any filesystem step fails.
pub fn write_json_artifact<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let body = serde_json::to_string_pretty(value).map_err(|source| ArtifactError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ArtifactError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut tmp_name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, body).map_err(|source| ArtifactError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), "artifact written");
    Ok(())
}

/// Read and decode a JSON artifact.
///
/// # Errors
///
/// Returns [`ArtifactError::Io`] if the file cannot be read and
/// [`ArtifactError::Parse`] if it does not decode into `T`.
pub fn read_json_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_file_name_plain() {
        assert_eq!(dataset_file_name("Sofas"), "Sofas_products.json");
    }

    #[test]
    fn dataset_file_name_keeps_spaces_and_unicode() {
        assert_eq!(
            dataset_file_name("Yemek Odası"),
            "Yemek Odası_products.json"
        );
    }

    #[test]
    fn dataset_file_name_neutralises_separators() {
        assert_eq!(
            dataset_file_name("Tables/Chairs"),
            "Tables_Chairs_products.json"
        );
        assert_eq!(dataset_file_name(".."), "__products.json");
        assert_eq!(dataset_file_name("a\\b\n"), "a_b__products.json");
    }

    #[test]
    fn dataset_from_set_sorts() {
        let ids: ProductIdSet = [30, 1, 7].into_iter().collect();
        let dataset = CategoryDataset::from_set("Chairs", &ids);
        assert_eq!(dataset.product_ids, vec![1, 7, 30]);
    }

    #[test]
    fn consolidated_index_keys_are_numeric_strings_in_numeric_order() {
        let mut products = BTreeMap::new();
        products.insert(10, vec!["Sofas".to_string()]);
        products.insert(2, vec!["Chairs".to_string()]);
        let index = ConsolidatedIndex {
            products,
            statistics: CategoryStatistics::default(),
            generated_at: "2026-01-01T00:00:00.000Z".to_string(),
            description: "test".to_string(),
        };

        let json = serde_json::to_string(&index).unwrap();
        let two = json.find("\"2\"").expect("key 2 present");
        let ten = json.find("\"10\"").expect("key 10 present");
        assert!(two < ten, "expected numeric key order in {json}");

        let back: ConsolidatedIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, index);
    }

    #[test]
    fn generated_at_is_utc_millis() {
        let ts = generated_at_now();
        assert!(ts.ends_with('Z'), "{ts}");
        let (_, frac) = ts.rsplit_once('.').expect("fractional seconds");
        assert_eq!(frac.len(), 4, "expected three digits plus Z in {ts}");
    }

    #[test]
    fn write_then_read_artifact_in_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("Sofas_products.json");
        let dataset = CategoryDataset {
            category_name: "Sofas".to_string(),
            product_ids: vec![1, 2, 3],
        };

        write_json_artifact(&path, &dataset).unwrap();
        let back: CategoryDataset = read_json_artifact(&path).unwrap();
        assert_eq!(back, dataset);

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temporary file should be renamed away");
    }

    #[test]
    fn read_missing_artifact_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_json_artifact::<CategoryDataset>(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }

    #[test]
    fn read_malformed_artifact_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = read_json_artifact::<CategoryDataset>(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { .. }));
    }
}
