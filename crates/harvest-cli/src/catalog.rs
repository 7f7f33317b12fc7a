//! `harvest consolidate` and `harvest categories`.

use std::path::Path;

use anyhow::Context;
use harvest_catalog::{consolidate, format_statistics, update_catalog, CatalogPaths};

pub(crate) fn run_consolidate(input_dir: &Path, output: &Path) -> anyhow::Result<()> {
    let report = consolidate(input_dir, output)
        .with_context(|| format!("consolidating datasets in {}", input_dir.display()))?;
    let stats = &report.index.statistics;

    println!(
        "consolidated {} file(s) ({} skipped) -> {}",
        report.files_seen - report.files_skipped,
        report.files_skipped,
        output.display()
    );
    println!("total products:                 {}", stats.total_products);
    println!("total categories:               {}", stats.total_categories);
    println!(
        "products in multiple categories: {}",
        stats.products_in_multiple_categories
    );
    println!(
        "max categories per product:      {}",
        stats.max_categories_per_product
    );
    println!();
    print!("{}", format_statistics(stats));
    Ok(())
}

pub(crate) fn run_categories(
    consolidated: &Path,
    registry_output: &Path,
    products_input: &Path,
    products_output: &Path,
) -> anyhow::Result<()> {
    let report = update_catalog(CatalogPaths {
        consolidated,
        registry_output,
        products_input,
        products_output,
    })
    .context("updating product catalog")?;

    println!("categories created:  {}", report.categories_created);
    println!("products processed:  {}", report.records_processed);
    println!("with categories:     {}", report.records_matched);
    println!("without categories:  {}", report.records_unmatched);
    println!("registry -> {}", registry_output.display());
    println!("catalog  -> {}", products_output.display());
    Ok(())
}
