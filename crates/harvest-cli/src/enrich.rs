//! `harvest enrich`: feed consolidated product ids to the external product
//! scraper in sequential batches.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use harvest_catalog::{load_worklist, BatchOrchestrator, BatchOutcome, CommandBatchExecutor};
use harvest_core::AppConfig;

pub(crate) async fn run_enrich(
    config: &AppConfig,
    consolidated: &Path,
    output: &Path,
    batch_size: Option<usize>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let ids = load_worklist(consolidated)
        .with_context(|| format!("loading product ids from {}", consolidated.display()))?;
    println!("found {} unique product ids", ids.len());

    let executor = CommandBatchExecutor::new(&config.enrich_program, config.enrich_args.clone());
    let orchestrator = BatchOrchestrator::new(executor)
        .batch_size(batch_size)
        .delay(Duration::from_millis(config.enrich_batch_delay_ms))
        .dry_run(dry_run);

    let report = orchestrator.run(&ids, output).await?;

    for batch in &report.batches {
        match &batch.outcome {
            BatchOutcome::DryRun { command, preview } => {
                println!(
                    "batch {} ({} products), dry run:",
                    batch.number, batch.product_count
                );
                println!("  {command}");
                let shown: Vec<String> = preview.iter().map(u64::to_string).collect();
                println!("  first product ids: {}", shown.join(", "));
                if batch.product_count > preview.len() {
                    println!("  ... and {} more", batch.product_count - preview.len());
                }
            }
            BatchOutcome::Completed { duration } => println!(
                "batch {} ({} products) completed in {}s -> {}",
                batch.number,
                batch.product_count,
                duration.as_secs(),
                batch.output_path.display()
            ),
        }
    }
    println!(
        "enrichment {}: {} products in {} batch(es)",
        if dry_run { "preview" } else { "complete" },
        report.total_products,
        report.batches.len()
    );
    Ok(())
}
