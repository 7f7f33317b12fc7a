//! Offline stages of the harvesting pipeline: consolidation, category
//! registry, catalog merge, and batched enrichment.

pub mod batch;
pub mod consolidate;
pub mod error;
pub mod merge;
pub mod registry;

pub use batch::{
    batch_output_path, load_worklist, plan_batches, worklist, BatchExecutor, BatchOrchestrator,
    BatchOutcome, BatchReport, BatchResult, BatchSpec, CommandBatchExecutor, ExecutionResult,
};
pub use consolidate::{
    build_index, consolidate, consolidate_dir, format_statistics, validate_dataset,
    ConsolidateReport, CONSOLIDATED_DESCRIPTION,
};
pub use error::{BatchError, CatalogError, DatasetRejection};
pub use merge::{load_raw_catalog, merge_catalog, update_catalog, CatalogPaths, MergeReport};
pub use registry::{build_registry, registry_lookup, REGISTRY_DESCRIPTION};
