//! Consolidation of per-category datasets into one inverted index.
//!
//! Every `*.json` file in the dataset directory is validated on its own; a
//! file with the wrong shape is skipped with a warning and the run
//! continues. At least one valid dataset is required.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use harvest_core::{
    generated_at_now, write_json_artifact, CategoryDataset, CategoryStatistics, ConsolidatedIndex,
    ProductIdSet,
};
use serde_json::Value;

use crate::error::{CatalogError, DatasetRejection};

pub const CONSOLIDATED_DESCRIPTION: &str =
    "Consolidated product-to-categories mapping from Caris scraper";

#[derive(Debug, Clone)]
pub struct ConsolidateReport {
    pub index: ConsolidatedIndex,
    /// `*.json` files found in the input directory.
    pub files_seen: usize,
    /// Files rejected during validation.
    pub files_skipped: usize,
}

/// Checks the shape of one decoded dataset file.
///
/// # Errors
///
/// Returns the first [`DatasetRejection`] that applies.
pub fn validate_dataset(value: &Value) -> Result<CategoryDataset, DatasetRejection> {
    let object = value.as_object().ok_or(DatasetRejection::NotAnObject)?;

    let category_name = object
        .get("category_name")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .ok_or(DatasetRejection::BadCategoryName)?;

    let raw_ids = object
        .get("product_ids")
        .and_then(Value::as_array)
        .ok_or(DatasetRejection::BadProductIds)?;

    let ids = raw_ids
        .iter()
        .enumerate()
        .map(|(index, id)| id.as_u64().ok_or(DatasetRejection::BadProductId { index }))
        .collect::<Result<ProductIdSet, _>>()?;

    Ok(CategoryDataset::from_set(category_name, &ids))
}

/// Builds the inverted index and its statistics from validated datasets.
///
/// Category lists are sorted alphabetically, so the result depends only on
/// the input datasets, never on their order. `generated_at` is copied as-is.
#[must_use]
pub fn build_index(datasets: &[CategoryDataset], generated_at: String) -> ConsolidatedIndex {
    let mut by_product: BTreeMap<u64, BTreeSet<&str>> = BTreeMap::new();
    let mut by_category: BTreeMap<&str, ProductIdSet> = BTreeMap::new();

    for dataset in datasets {
        let name = dataset.category_name.as_str();
        if by_category.contains_key(name) {
            tracing::warn!(category = name, "category appears in more than one dataset, merging");
        }
        by_category
            .entry(name)
            .or_default()
            .extend(dataset.product_ids.iter().copied());

        for id in &dataset.product_ids {
            by_product.entry(*id).or_default().insert(name);
        }
    }

    let products: BTreeMap<u64, Vec<String>> = by_product
        .into_iter()
        .map(|(id, names)| (id, names.into_iter().map(str::to_owned).collect()))
        .collect();

    let statistics = CategoryStatistics {
        total_products: products.len(),
        total_categories: datasets.len(),
        category_product_counts: by_category
            .into_iter()
            .map(|(name, ids)| (name.to_owned(), ids.len()))
            .collect(),
        products_in_multiple_categories: products.values().filter(|c| c.len() > 1).count(),
        max_categories_per_product: products.values().map(Vec::len).max().unwrap_or(0),
    };

    ConsolidatedIndex {
        products,
        statistics,
        generated_at,
        description: CONSOLIDATED_DESCRIPTION.to_owned(),
    }
}

/// Reads and validates every dataset in `input_dir` and builds the index.
///
/// # Errors
///
/// Returns [`CatalogError::InputDir`] if the directory cannot be listed and
/// [`CatalogError::NoValidDatasets`] if no file passes validation.
pub fn consolidate_dir(input_dir: &Path) -> Result<ConsolidateReport, CatalogError> {
    let files = dataset_files(input_dir)?;
    tracing::info!(dir = %input_dir.display(), files = files.len(), "found dataset files");

    let mut datasets = Vec::with_capacity(files.len());
    let mut skipped = 0usize;
    for path in &files {
        match load_dataset(path) {
            Ok(dataset) => {
                tracing::info!(
                    file = %path.display(),
                    category = %dataset.category_name,
                    products = dataset.product_ids.len(),
                    "loaded dataset"
                );
                datasets.push(dataset);
            }
            Err(reason) => {
                tracing::warn!(file = %path.display(), reason = %reason, "skipping dataset file");
                skipped += 1;
            }
        }
    }

    if datasets.is_empty() {
        return Err(CatalogError::NoValidDatasets {
            path: input_dir.to_path_buf(),
            skipped,
        });
    }

    let index = build_index(&datasets, generated_at_now());
    tracing::info!(
        products = index.statistics.total_products,
        categories = index.statistics.total_categories,
        multi_category = index.statistics.products_in_multiple_categories,
        "consolidation complete"
    );

    Ok(ConsolidateReport {
        index,
        files_seen: files.len(),
        files_skipped: skipped,
    })
}

/// [`consolidate_dir`] followed by writing the index to `output_path`.
///
/// # Errors
///
/// Propagates [`consolidate_dir`] errors and artifact write failures.
pub fn consolidate(input_dir: &Path, output_path: &Path) -> Result<ConsolidateReport, CatalogError> {
    let report = consolidate_dir(input_dir)?;
    write_json_artifact(output_path, &report.index)?;
    tracing::info!(path = %output_path.display(), "consolidated index saved");
    Ok(report)
}

/// Products-per-category table, largest categories first.
#[must_use]
pub fn format_statistics(statistics: &CategoryStatistics) -> String {
    let mut rows: Vec<(&String, &usize)> = statistics.category_product_counts.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let width = rows
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Category".len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<width$}  {:>8}", "Category", "Products");
    let _ = writeln!(out, "{}  {}", "-".repeat(width), "-".repeat(8));
    for (name, count) in rows {
        let _ = writeln!(out, "{name:<width$}  {count:>8}");
    }
    out
}

fn dataset_files(input_dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let entries = std::fs::read_dir(input_dir).map_err(|source| CatalogError::InputDir {
        path: input_dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

fn load_dataset(path: &Path) -> Result<CategoryDataset, DatasetRejection> {
    let content =
        std::fs::read_to_string(path).map_err(|e| DatasetRejection::Unreadable(e.to_string()))?;
    let value: Value =
        serde_json::from_str(&content).map_err(|e| DatasetRejection::Syntax(e.to_string()))?;
    validate_dataset(&value)
}

#[cfg(test)]
#[path = "consolidate_test.rs"]
mod tests;
