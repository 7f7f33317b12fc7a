use std::sync::Mutex;

use super::*;

/// Records submissions and fails the chunk numbers listed in `fail_on`.
#[derive(Default)]
struct RecordingExecutor {
    fail_on: Vec<usize>,
    calls: Mutex<Vec<(Vec<u64>, PathBuf)>>,
}

#[async_trait]
impl BatchExecutor for RecordingExecutor {
    async fn submit(
        &self,
        ids: &[u64],
        output_path: &Path,
    ) -> Result<ExecutionResult, BatchError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((ids.to_vec(), output_path.to_path_buf()));
        let failed = self.fail_on.contains(&calls.len());
        Ok(ExecutionResult {
            exit_code: Some(i32::from(failed)),
            duration: Duration::from_millis(1),
        })
    }

    fn describe(&self, ids: &[u64], output_path: &Path) -> String {
        format!("enrich {} -> {}", ids.len(), output_path.display())
    }
}

fn ids(n: u64) -> Vec<u64> {
    (1..=n).collect()
}

#[test]
fn batch_output_path_inserts_suffix_before_extension() {
    assert_eq!(
        batch_output_path(Path::new("out/detailed.json"), 3),
        PathBuf::from("out/detailed_batch_3.json")
    );
    assert_eq!(
        batch_output_path(Path::new("detailed"), 1),
        PathBuf::from("detailed_batch_1")
    );
}

#[test]
fn plan_splits_into_contiguous_chunks() {
    let plan = plan_batches(&ids(7), Some(3), Path::new("d.json")).unwrap();

    let chunks: Vec<Vec<u64>> = plan.iter().map(|b| b.ids.clone()).collect();
    assert_eq!(chunks, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]);
    assert_eq!(plan[2].number, 3);
    assert_eq!(plan[2].output_path, PathBuf::from("d_batch_3.json"));
}

#[test]
fn plan_without_chunking_uses_plain_output() {
    for size in [None, Some(7), Some(100)] {
        let plan = plan_batches(&ids(7), size, Path::new("d.json")).unwrap();
        assert_eq!(plan.len(), 1, "batch size {size:?}");
        assert_eq!(plan[0].output_path, PathBuf::from("d.json"));
        assert_eq!(plan[0].ids.len(), 7);
    }
}

#[test]
fn plan_rejects_empty_worklist_and_zero_size() {
    assert!(matches!(
        plan_batches(&[], Some(5), Path::new("d.json")),
        Err(BatchError::EmptyWorklist)
    ));
    assert!(matches!(
        plan_batches(&ids(3), Some(0), Path::new("d.json")),
        Err(BatchError::InvalidBatchSize)
    ));
}

#[tokio::test]
async fn runs_every_chunk_in_order() {
    let orchestrator = BatchOrchestrator::new(RecordingExecutor::default()).batch_size(Some(2));

    let report = orchestrator
        .run(&ids(5), Path::new("d.json"))
        .await
        .expect("all batches succeed");

    assert_eq!(report.total_products, 5);
    assert_eq!(report.batches.len(), 3);
    assert!(report
        .batches
        .iter()
        .all(|b| matches!(b.outcome, BatchOutcome::Completed { .. })));

    let calls = orchestrator.executor.calls.lock().unwrap();
    let submitted: Vec<Vec<u64>> = calls.iter().map(|(ids, _)| ids.clone()).collect();
    assert_eq!(submitted, vec![vec![1, 2], vec![3, 4], vec![5]]);
}

#[tokio::test]
async fn first_failure_aborts_remaining_chunks() {
    let executor = RecordingExecutor {
        fail_on: vec![2],
        ..RecordingExecutor::default()
    };
    let orchestrator = BatchOrchestrator::new(executor).batch_size(Some(2));

    let err = orchestrator
        .run(&ids(6), Path::new("d.json"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, BatchError::Aborted { batch: 2, total: 3, ref reason } if reason.contains("code 1")),
        "got: {err:?}"
    );
    assert_eq!(orchestrator.executor.calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn dry_run_never_submits() {
    let orchestrator = BatchOrchestrator::new(RecordingExecutor::default())
        .batch_size(Some(12))
        .delay(Duration::from_secs(60))
        .dry_run(true);

    let report = orchestrator
        .run(&ids(30), Path::new("d.json"))
        .await
        .expect("dry run succeeds");

    assert!(orchestrator.executor.calls.lock().unwrap().is_empty());
    assert_eq!(report.batches.len(), 3);
    match &report.batches[0].outcome {
        BatchOutcome::DryRun { command, preview } => {
            assert_eq!(command, "enrich 12 -> d_batch_1.json");
            assert_eq!(preview, &ids(10));
        }
        other => panic!("expected dry run, got {other:?}"),
    }
}

#[tokio::test]
async fn delay_separates_chunks() {
    let orchestrator = BatchOrchestrator::new(RecordingExecutor::default())
        .batch_size(Some(1))
        .delay(Duration::from_millis(40));

    let started = Instant::now();
    orchestrator.run(&ids(3), Path::new("d.json")).await.unwrap();

    // Two gaps between three chunks, none after the last.
    assert!(started.elapsed() >= Duration::from_millis(75));
}

#[test]
fn worklist_is_sorted_index_keys() {
    let index: ConsolidatedIndex = serde_json::from_value(serde_json::json!({
        "products": {"10": ["B"], "2": ["A"], "7": ["A", "B"]},
        "statistics": {
            "total_products": 3,
            "total_categories": 2,
            "category_product_counts": {"A": 2, "B": 2},
            "products_in_multiple_categories": 1,
            "max_categories_per_product": 2
        },
        "generated_at": "2026-01-01T00:00:00.000Z",
        "description": "test"
    }))
    .unwrap();

    assert_eq!(worklist(&index), vec![2, 7, 10]);
}

#[test]
fn command_executor_describes_full_invocation() {
    let executor = CommandBatchExecutor::new(
        "uv",
        vec!["run".into(), "python".into(), "./parallel_scraper.py".into()],
    );
    assert_eq!(
        executor.describe(&[11, 12], Path::new("detailed_batch_1.json")),
        "uv run python ./parallel_scraper.py --output detailed_batch_1.json 11 12"
    );
}

#[cfg(unix)]
#[tokio::test]
async fn command_executor_passes_output_and_ids() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("detailed.json");
    // sh -c SCRIPT NAME --output PATH IDS...: $1 is --output, $2 the path.
    let executor = CommandBatchExecutor::new(
        "sh",
        vec![
            "-c".into(),
            r#"out="$2"; shift 2; echo "$@" > "$out""#.into(),
            "enrich".into(),
        ],
    );

    let result = executor.submit(&[3, 4, 5], &output).await.unwrap();

    assert!(result.success());
    assert_eq!(std::fs::read_to_string(&output).unwrap().trim(), "3 4 5");
}

#[cfg(unix)]
#[tokio::test]
async fn command_executor_reports_exit_code() {
    let executor = CommandBatchExecutor::new("sh", vec!["-c".into(), "exit 3".into()]);
    let result = executor.submit(&[1], Path::new("unused.json")).await.unwrap();
    assert_eq!(result.exit_code, Some(3));
    assert!(!result.success());
}

#[tokio::test]
async fn missing_program_is_spawn_error() {
    let executor = CommandBatchExecutor::new("/nonexistent/harvest-enrich", Vec::new());
    let err = executor.submit(&[1], Path::new("unused.json")).await.unwrap_err();
    assert!(matches!(err, BatchError::Spawn { .. }));
}
