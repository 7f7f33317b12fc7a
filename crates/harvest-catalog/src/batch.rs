//! Sequential batch driver for the external per-product enrichment step.
//!
//! The worklist is split into contiguous chunks that run one at a time.
//! The first failing chunk aborts the run; chunks after it are never
//! started. In dry-run mode nothing is executed and each would-be
//! invocation is reported instead.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use harvest_core::{read_json_artifact, ConsolidatedIndex};

use crate::error::{BatchError, CatalogError};

/// Ids shown in a dry-run preview.
const PREVIEW_IDS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

impl ExecutionResult {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs enrichment for one chunk of product ids.
#[async_trait]
pub trait BatchExecutor: Send + Sync {
    /// Process `ids`, writing results to `output_path`, and wait for completion.
    async fn submit(&self, ids: &[u64], output_path: &Path)
        -> Result<ExecutionResult, BatchError>;

    /// Human-readable form of what `submit` would do, for dry runs.
    fn describe(&self, ids: &[u64], output_path: &Path) -> String;
}

/// Runs `<program> <args…> --output <path> <id>…` as a child process with
/// inherited stdio.
#[derive(Debug, Clone)]
pub struct CommandBatchExecutor {
    program: String,
    args: Vec<String>,
}

impl CommandBatchExecutor {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn command_args(&self, ids: &[u64], output_path: &Path) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("--output".to_owned());
        args.push(output_path.display().to_string());
        args.extend(ids.iter().map(u64::to_string));
        args
    }
}

#[async_trait]
impl BatchExecutor for CommandBatchExecutor {
    async fn submit(
        &self,
        ids: &[u64],
        output_path: &Path,
    ) -> Result<ExecutionResult, BatchError> {
        let started = Instant::now();
        let status = tokio::process::Command::new(&self.program)
            .args(self.command_args(ids, output_path))
            .status()
            .await
            .map_err(|source| BatchError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        Ok(ExecutionResult {
            exit_code: status.code(),
            duration: started.elapsed(),
        })
    }

    fn describe(&self, ids: &[u64], output_path: &Path) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.command_args(ids, output_path));
        parts.join(" ")
    }
}

/// One planned chunk. `number` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSpec {
    pub number: usize,
    pub ids: Vec<u64>,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed { duration: Duration },
    DryRun { command: String, preview: Vec<u64> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub number: usize,
    pub product_count: usize,
    pub output_path: PathBuf,
    pub outcome: BatchOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub total_products: usize,
    pub batches: Vec<BatchResult>,
}

/// `<stem>_batch_<n>.<ext>` beside `output`.
#[must_use]
pub fn batch_output_path(output: &Path, number: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .map_or_else(|| "products".into(), |s| s.to_string_lossy());
    let name = match output.extension() {
        Some(ext) => format!("{stem}_batch_{number}.{}", ext.to_string_lossy()),
        None => format!("{stem}_batch_{number}"),
    };
    output.with_file_name(name)
}

/// Splits `ids` into chunks of `batch_size`.
///
/// Without a batch size, or when everything fits in one chunk, a single
/// chunk writes to `output` itself.
///
/// # Errors
///
/// Returns [`BatchError::EmptyWorklist`] for an empty worklist and
/// [`BatchError::InvalidBatchSize`] for a batch size of zero.
pub fn plan_batches(
    ids: &[u64],
    batch_size: Option<usize>,
    output: &Path,
) -> Result<Vec<BatchSpec>, BatchError> {
    if ids.is_empty() {
        return Err(BatchError::EmptyWorklist);
    }

    match batch_size {
        Some(0) => Err(BatchError::InvalidBatchSize),
        Some(size) if ids.len() > size => Ok(ids
            .chunks(size)
            .enumerate()
            .map(|(i, chunk)| BatchSpec {
                number: i + 1,
                ids: chunk.to_vec(),
                output_path: batch_output_path(output, i + 1),
            })
            .collect()),
        _ => Ok(vec![BatchSpec {
            number: 1,
            ids: ids.to_vec(),
            output_path: output.to_path_buf(),
        }]),
    }
}

/// Product ids from a consolidated index, ascending.
#[must_use]
pub fn worklist(index: &ConsolidatedIndex) -> Vec<u64> {
    index.products.keys().copied().collect()
}

/// Reads the worklist from a consolidated index file.
///
/// # Errors
///
/// Returns [`CatalogError::Artifact`] if the file cannot be read or parsed.
pub fn load_worklist(path: &Path) -> Result<Vec<u64>, CatalogError> {
    let index: ConsolidatedIndex = read_json_artifact(path)?;
    Ok(worklist(&index))
}

pub struct BatchOrchestrator<E: BatchExecutor> {
    executor: E,
    batch_size: Option<usize>,
    delay: Duration,
    dry_run: bool,
}

impl<E: BatchExecutor> BatchOrchestrator<E> {
    #[must_use]
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            batch_size: None,
            delay: Duration::ZERO,
            dry_run: false,
        }
    }

    #[must_use]
    pub fn batch_size(mut self, batch_size: Option<usize>) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Pause between successive chunks.
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Runs every chunk of `ids` in order.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::EmptyWorklist`] or [`BatchError::InvalidBatchSize`]
    /// before anything runs, and [`BatchError::Aborted`] for the first chunk
    /// that fails to launch or exits unsuccessfully.
    pub async fn run(&self, ids: &[u64], output: &Path) -> Result<BatchReport, BatchError> {
        let plan = plan_batches(ids, self.batch_size, output)?;
        let total = plan.len();
        tracing::info!(
            products = ids.len(),
            batches = total,
            dry_run = self.dry_run,
            "starting enrichment"
        );

        let mut batches = Vec::with_capacity(total);
        for spec in plan {
            tracing::info!(
                batch = spec.number,
                total,
                products = spec.ids.len(),
                output = %spec.output_path.display(),
                "processing batch"
            );

            let outcome = if self.dry_run {
                BatchOutcome::DryRun {
                    command: self.executor.describe(&spec.ids, &spec.output_path),
                    preview: spec.ids.iter().take(PREVIEW_IDS).copied().collect(),
                }
            } else {
                let duration = self.execute(&spec, total).await?;
                BatchOutcome::Completed { duration }
            };

            batches.push(BatchResult {
                number: spec.number,
                product_count: spec.ids.len(),
                output_path: spec.output_path,
                outcome,
            });

            if !self.dry_run && spec.number < total && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        Ok(BatchReport {
            total_products: ids.len(),
            batches,
        })
    }

    async fn execute(&self, spec: &BatchSpec, total: usize) -> Result<Duration, BatchError> {
        let aborted = |reason: String| {
            tracing::error!(batch = spec.number, total, reason = %reason, "batch failed, aborting");
            BatchError::Aborted {
                batch: spec.number,
                total,
                reason,
            }
        };

        let result = self
            .executor
            .submit(&spec.ids, &spec.output_path)
            .await
            .map_err(|e| aborted(e.to_string()))?;

        if !result.success() {
            return Err(aborted(match result.exit_code {
                Some(code) => format!("exited with code {code}"),
                None => "terminated by signal".to_owned(),
            }));
        }

        tracing::info!(
            batch = spec.number,
            total,
            duration_secs = result.duration.as_secs_f64(),
            "batch completed"
        );
        Ok(result.duration)
    }
}

#[cfg(test)]
#[path = "batch_test.rs"]
mod tests;
