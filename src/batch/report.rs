//! Result aggregation.

use crate::batch::policy::FinishedRun;
use crate::batch::types::ExecutionReport;

/// Assemble the final report.
///
/// `batchable` is the number of operations the classifier routed to the
/// aggregated call. The run counts as optimized when more than one was
/// routed there and the run made fewer calls than it had operations.
///
/// The flag describes the plan, not what was sent: a run that closes
/// before the aggregated call goes out still reports `batch_optimized`
/// with `api_call_count == 0`.
pub(crate) fn aggregate(run: FinishedRun, batchable: usize) -> ExecutionReport {
    let total_operations = run.results.len();
    let success_count = run.results.iter().filter(|r| r.success).count();

    ExecutionReport {
        total_operations,
        success_count,
        failure_count: total_operations - success_count,
        batch_optimized: batchable > 1 && run.api_calls < total_operations,
        results: run.results,
        stopped_at_index: run.stopped_at,
        rolled_back: run.rolled_back,
        rollback_error: run.rollback_error,
        api_call_count: run.api_calls,
        cancelled: run.cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::policy::RunState;
    use crate::batch::types::{ErrorCode, OnErrorMode};

    #[test]
    fn test_counts_and_optimization_flag() {
        let mut run = RunState::new(OnErrorMode::Continue, vec!["create_slide".to_string(); 3]);
        run.record_call();
        run.record_success(0, serde_json::json!({}));
        run.record_success(1, serde_json::json!({}));
        run.record_failure(2, ErrorCode::PostProcessError, "bad reply");

        let report = aggregate(run.finish(), 3);
        assert_eq!(report.total_operations, 3);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.failure_count, 1);
        assert_eq!(report.api_call_count, 1);
        assert!(report.batch_optimized);
        assert!(report.results.iter().enumerate().all(|(i, r)| r.index == i));
    }

    #[test]
    fn test_single_batchable_is_not_optimized() {
        let mut run = RunState::new(OnErrorMode::Stop, vec!["x".to_string(); 2]);
        run.record_call();
        run.record_call();
        run.record_success(0, serde_json::json!({}));
        run.record_success(1, serde_json::json!({}));

        let report = aggregate(run.finish(), 1);
        assert!(!report.batch_optimized);
    }
}
