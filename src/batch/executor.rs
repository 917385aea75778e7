//! The two execution phases of a run.
//!
//! Both phases dispatch one remote call at a time and race it against the
//! caller's cancellation token.

use crate::batch::StandaloneExecutor;
use crate::batch::classifier::{CompiledOperation, StandaloneOperation};
use crate::batch::failure::FailureClassifier;
use crate::batch::policy::RunState;
use crate::batch::types::{ErrorCode, LogicalOperation};
use crate::context::ToolContext;
use crate::ops::{CompiledRequests, ResultExtractor};
use crate::slides::DocumentService;
use crate::tools::ToolError;

/// Where one operation's replies sit in the aggregated response.
struct ReplySlot {
    index: usize,
    count: usize,
    extractor: ResultExtractor,
}

/// Send every batchable operation in one aggregated call and hand each
/// extractor its own slice of the replies.
pub(crate) async fn run_batch_phase(
    documents: &dyn DocumentService,
    presentation_id: &str,
    batchable: Vec<CompiledOperation>,
    state: &mut RunState,
    ctx: &ToolContext,
) {
    if batchable.is_empty() || state.is_closed() {
        return;
    }
    if ctx.is_cancelled() {
        state.cancel();
        return;
    }

    let mut requests = Vec::new();
    let mut slots = Vec::with_capacity(batchable.len());
    for op in batchable {
        let CompiledRequests {
            requests: own,
            extractor,
        } = op.compiled;
        slots.push(ReplySlot {
            index: op.index,
            count: own.len(),
            extractor,
        });
        requests.extend(own);
    }
    let total_requests = requests.len();

    tracing::debug!(
        presentation_id = %presentation_id,
        operations = slots.len(),
        requests = total_requests,
        "Sending aggregated call"
    );

    state.record_call();
    let outcome = tokio::select! {
        biased;
        _ = ctx.cancellation.cancelled() => None,
        result = documents.execute_batch(&ctx.credentials, presentation_id, requests) => Some(result),
    };

    match outcome {
        None => {
            for slot in &slots {
                state.record_interrupted(slot.index);
            }
        }
        Some(Ok(response)) => {
            state.mark_applied();
            if response.replies.len() != total_requests {
                tracing::warn!(
                    expected = total_requests,
                    received = response.replies.len(),
                    "Aggregated call returned an unexpected number of replies"
                );
            }

            let mut offset = 0;
            for slot in slots {
                match (slot.extractor)(&response.replies, offset) {
                    Ok(result) => state.record_success(slot.index, result),
                    Err(message) => {
                        state.record_failure(slot.index, ErrorCode::PostProcessError, message)
                    }
                }
                offset += slot.count;
            }
        }
        Some(Err(err)) => {
            for slot in &slots {
                state.record_failure(
                    slot.index,
                    ErrorCode::BatchError,
                    format!("aggregated call failed: {}", err),
                );
            }
            state.note_batch_rolled_back(total_requests);
        }
    }
}

/// Run each standalone operation through its handler, in index order.
pub(crate) async fn run_sequential_phase(
    executor: &dyn StandaloneExecutor,
    classifier: &dyn FailureClassifier,
    presentation_id: &str,
    operations: &[LogicalOperation],
    standalone: &[StandaloneOperation],
    state: &mut RunState,
    ctx: &ToolContext,
) {
    for op in standalone {
        if state.is_closed() {
            break;
        }
        if ctx.is_cancelled() {
            state.cancel();
            break;
        }

        let parameters = &operations[op.index].parameters;
        tracing::debug!(index = op.index, kind = %op.kind, "Running standalone operation");

        state.record_call();
        let outcome = tokio::select! {
            biased;
            _ = ctx.cancellation.cancelled() => None,
            result = executor.execute(op.kind, presentation_id, parameters, ctx) => Some(result),
        };

        match outcome {
            None => {
                state.record_interrupted(op.index);
                break;
            }
            Some(Err(ToolError::Cancelled)) => {
                state.record_cancelled_unsent(op.index);
                break;
            }
            Some(Ok(result)) => {
                state.mark_applied();
                state.record_success(op.index, result);
            }
            Some(Err(err)) => {
                if matches!(err, ToolError::PostProcess(_)) {
                    state.mark_applied();
                }
                let code = classifier.classify(&err);
                state.record_failure(op.index, code, err.to_string());
            }
        }
    }
}
