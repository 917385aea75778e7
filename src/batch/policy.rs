//! Per-run outcome bookkeeping and the on-error policy.

use crate::batch::types::{ErrorCode, OnErrorMode, OperationResult};

/// Mutable state of one orchestration run.
///
/// Holds at most one outcome per index. Once a failure closes the run
/// under `stop` or `rollback`, nothing else is attempted and the open
/// slots become `SKIPPED` at the end.
#[derive(Debug)]
pub struct RunState {
    mode: OnErrorMode,
    kinds: Vec<String>,
    results: Vec<Option<OperationResult>>,
    stopped_at: Option<usize>,
    api_calls: usize,
    rolled_back: bool,
    rollback_error: Option<String>,
    cancelled: bool,
    /// Some write reached the remote document.
    applied: bool,
}

impl RunState {
    pub fn new(mode: OnErrorMode, kinds: Vec<String>) -> Self {
        let results = vec![None; kinds.len()];
        Self {
            mode,
            kinds,
            results,
            stopped_at: None,
            api_calls: 0,
            rolled_back: false,
            rollback_error: None,
            cancelled: false,
            applied: false,
        }
    }

    pub fn mode(&self) -> OnErrorMode {
        self.mode
    }

    /// No further operation may be attempted.
    pub fn is_closed(&self) -> bool {
        self.stopped_at.is_some() || self.cancelled
    }

    #[cfg(test)]
    pub fn stopped_at(&self) -> Option<usize> {
        self.stopped_at
    }

    pub fn record_call(&mut self) {
        self.api_calls += 1;
    }

    /// Mark that the remote document was changed.
    pub fn mark_applied(&mut self) {
        self.applied = true;
    }

    pub fn record_success(&mut self, index: usize, result: serde_json::Value) {
        let kind = self.kinds[index].clone();
        self.set(index, OperationResult::success(index, kind, result));
    }

    /// Record a failure and apply the on-error policy.
    pub fn record_failure(&mut self, index: usize, code: ErrorCode, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(index, kind = %self.kinds[index], code = %code, "Operation failed: {}", message);

        let kind = self.kinds[index].clone();
        self.set(index, OperationResult::failure(index, kind, code, message));

        if self.mode.halts_on_failure() && self.stopped_at.is_none() {
            tracing::info!(index, mode = %self.mode, "Run stopped after failure");
            self.stopped_at = Some(index);
        }
    }

    /// Close the run because the caller cancelled.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            tracing::info!("Run cancelled");
        }
        self.cancelled = true;
    }

    /// Record an operation whose call was in flight when cancellation fired.
    pub fn record_interrupted(&mut self, index: usize) {
        let kind = self.kinds[index].clone();
        self.set(
            index,
            OperationResult::failure(
                index,
                kind,
                ErrorCode::Cancelled,
                "cancelled while the remote call was in flight; remote outcome unknown",
            ),
        );
        self.cancel();
    }

    /// Record an operation whose handler gave up on cancellation before
    /// sending its write.
    pub fn record_cancelled_unsent(&mut self, index: usize) {
        let kind = self.kinds[index].clone();
        self.set(
            index,
            OperationResult::failure(
                index,
                kind,
                ErrorCode::Cancelled,
                "cancelled before its write was sent",
            ),
        );
        self.cancel();
    }

    /// The aggregated call failed, so nothing it carried was applied.
    pub fn note_batch_rolled_back(&mut self, requests: usize) {
        if self.mode == OnErrorMode::Rollback {
            self.rolled_back = true;
            self.rollback_error = Some(format!(
                "aggregated call failed; none of its {} requests were applied. \
                 Changes made by other calls cannot be undone",
                requests
            ));
        }
    }

    fn set(&mut self, index: usize, result: OperationResult) {
        debug_assert!(self.results[index].is_none(), "index {} recorded twice", index);
        self.results[index] = Some(result);
    }

    /// Fill every open slot and hand the results over.
    pub(crate) fn finish(mut self) -> FinishedRun {
        let fill = if self.cancelled {
            (ErrorCode::Cancelled, "cancelled before it was attempted")
        } else {
            (ErrorCode::Skipped, "skipped after an earlier failure")
        };

        if self.mode == OnErrorMode::Rollback
            && self.stopped_at.is_some()
            && !self.rolled_back
            && self.applied
        {
            self.rollback_error = Some(
                "changes applied before the failure were not undone; \
                 the remote service has no multi-call transactions"
                    .to_string(),
            );
        }

        let results = self
            .results
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    OperationResult::failure(index, self.kinds[index].clone(), fill.0, fill.1)
                })
            })
            .collect();

        FinishedRun {
            results,
            stopped_at: self.stopped_at,
            api_calls: self.api_calls,
            rolled_back: self.rolled_back,
            rollback_error: self.rollback_error,
            cancelled: self.cancelled,
        }
    }
}

/// Closed-out run, ready for aggregation.
#[derive(Debug)]
pub(crate) struct FinishedRun {
    pub results: Vec<OperationResult>,
    pub stopped_at: Option<usize>,
    pub api_calls: usize,
    pub rolled_back: bool,
    pub rollback_error: Option<String>,
    pub cancelled: bool,
}
