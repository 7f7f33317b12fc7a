//! Attaches category ids to raw product records.
//!
//! The merge is total and order-preserving: every input record comes out,
//! in the same position, with a `categoryIds` array. Records that cannot be
//! matched get an empty array instead of an error.

use std::collections::HashMap;
use std::path::Path;

use harvest_core::{
    generated_at_now, read_json_artifact, write_json_artifact, CategoryRegistry, ConsolidatedIndex,
};
use serde_json::Value;

use crate::error::CatalogError;
use crate::registry::{build_registry, registry_lookup};

const PROGRESS_EVERY: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub categories_created: usize,
    pub records_processed: usize,
    /// Records whose `categoryIds` ended up non-empty.
    pub records_matched: usize,
    pub records_unmatched: usize,
}

/// Reads a `productId` given either as an integer or a numeric string.
fn product_id(record: &Value) -> Option<u64> {
    match record.get("productId")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Sets `categoryIds` on every record from the index and registry.
///
/// A product's ids follow the order of its (alphabetically sorted) category
/// names. Any existing `categoryIds` field is replaced.
#[must_use]
pub fn merge_catalog(
    records: Vec<Value>,
    index: &ConsolidatedIndex,
    registry: &CategoryRegistry,
) -> (Vec<Value>, MergeReport) {
    let ids_by_name = registry_lookup(registry);
    let total = records.len();
    let mut report = MergeReport {
        categories_created: registry.categories.len(),
        ..MergeReport::default()
    };

    let merged = records
        .into_iter()
        .enumerate()
        .map(|(position, mut record)| {
            let category_ids = product_id(&record)
                .and_then(|id| index.products.get(&id))
                .map(|names| resolve(names, &ids_by_name))
                .unwrap_or_default();

            if category_ids.is_empty() {
                report.records_unmatched += 1;
            } else {
                report.records_matched += 1;
            }

            match record.as_object_mut() {
                Some(fields) => {
                    fields.insert("categoryIds".to_owned(), Value::from(category_ids));
                }
                None => {
                    tracing::warn!(position, "record is not an object, passing through unchanged");
                }
            }

            report.records_processed += 1;
            if report.records_processed % PROGRESS_EVERY == 0 {
                tracing::info!(processed = report.records_processed, total, "merging products");
            }
            record
        })
        .collect();

    (merged, report)
}

fn resolve(names: &[String], ids_by_name: &HashMap<&str, u32>) -> Vec<u32> {
    names
        .iter()
        .filter_map(|name| {
            let id = ids_by_name.get(name.as_str()).copied();
            if id.is_none() {
                tracing::warn!(category = %name, "category missing from registry");
            }
            id
        })
        .collect()
}

/// Reads the raw catalog, which must be a JSON array.
///
/// # Errors
///
/// Returns [`CatalogError::Artifact`] if the file cannot be read or parsed
/// and [`CatalogError::InvalidCatalog`] if the top level is not an array.
pub fn load_raw_catalog(path: &Path) -> Result<Vec<Value>, CatalogError> {
    match read_json_artifact::<Value>(path)? {
        Value::Array(records) => Ok(records),
        other => Err(CatalogError::InvalidCatalog(format!(
            "{} holds a JSON {}",
            path.display(),
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// File locations for one registry + merge run.
#[derive(Debug, Clone, Copy)]
pub struct CatalogPaths<'a> {
    pub consolidated: &'a Path,
    pub registry_output: &'a Path,
    pub products_input: &'a Path,
    pub products_output: &'a Path,
}

/// Builds the registry from the consolidated index, writes it, then merges
/// category ids into the raw catalog and writes the updated catalog.
///
/// # Errors
///
/// Returns [`CatalogError`] if any input is missing or malformed, or an
/// output cannot be written.
pub fn update_catalog(paths: CatalogPaths<'_>) -> Result<MergeReport, CatalogError> {
    let index: ConsolidatedIndex = read_json_artifact(paths.consolidated)?;
    tracing::info!(
        path = %paths.consolidated.display(),
        products = index.products.len(),
        "loaded consolidated index"
    );

    let registry = build_registry(&index, generated_at_now());
    write_json_artifact(paths.registry_output, &registry)?;
    tracing::info!(
        path = %paths.registry_output.display(),
        categories = registry.categories.len(),
        "category registry saved"
    );

    let records = load_raw_catalog(paths.products_input)?;
    tracing::info!(
        path = %paths.products_input.display(),
        records = records.len(),
        "loaded raw catalog"
    );

    let (merged, report) = merge_catalog(records, &index, &registry);
    write_json_artifact(paths.products_output, &merged)?;
    tracing::info!(
        path = %paths.products_output.display(),
        matched = report.records_matched,
        unmatched = report.records_unmatched,
        "updated catalog saved"
    );

    Ok(report)
}

#[cfg(test)]
#[path = "merge_test.rs"]
mod tests;
