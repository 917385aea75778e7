//! Batch-operation orchestrator.
//!
//! Runs a heterogeneous list of operations against one presentation with
//! as few remote round trips as possible:
//!
//! ```text
//!   validate request ─► fetch document ─► classify
//!                                            │
//!            ┌───────────────────────────────┼──────────────────────┐
//!            ▼                               ▼                      ▼
//!        invalid                         batchable               standalone
//!   (recorded at once)        (one aggregated call, replies   (one handler call
//!                              sliced by offset)               each, in order)
//!            └───────────────────────────────┴──────────────────────┘
//!                                            ▼
//!                              on-error policy ─► report
//! ```
//!
//! Nothing runs concurrently within a run. Operation failures never escape
//! as errors; they are recorded in the report. Only request-level problems
//! return [`BatchError`].

mod classifier;
mod executor;
mod failure;
mod policy;
mod report;
mod types;

pub use classifier::{ClassificationOutcome, CompiledOperation, Rejection, StandaloneOperation, classify};
pub use failure::{FailureClassifier, StatusFirstClassifier};
pub use types::{
    BatchRequest, ErrorCode, ExecutionReport, LogicalOperation, OnErrorMode, OperationResult,
    OperationSpec,
};

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::BatchConfig;
use crate::context::ToolContext;
use crate::error::BatchError;
use crate::ops::{CompileContext, Compilation, OperationKind, OperationRegistry};
use crate::slides::DocumentService;
use crate::tools::ToolError;

use policy::RunState;

/// Compiles operations into wire requests.
pub trait RequestCompiler: Send + Sync {
    fn compile(
        &self,
        kind: OperationKind,
        params: &serde_json::Value,
        ctx: &CompileContext<'_>,
    ) -> Compilation;
}

/// Runs one operation on its own against the remote services.
#[async_trait]
pub trait StandaloneExecutor: Send + Sync {
    async fn execute(
        &self,
        kind: OperationKind,
        presentation_id: &str,
        params: &serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<serde_json::Value, ToolError>;
}

impl RequestCompiler for OperationRegistry {
    fn compile(
        &self,
        kind: OperationKind,
        params: &serde_json::Value,
        ctx: &CompileContext<'_>,
    ) -> Compilation {
        OperationRegistry::compile(self, kind, params, ctx)
    }
}

#[async_trait]
impl StandaloneExecutor for OperationRegistry {
    async fn execute(
        &self,
        kind: OperationKind,
        presentation_id: &str,
        params: &serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<serde_json::Value, ToolError> {
        OperationRegistry::execute(self, kind, presentation_id, params, ctx).await
    }
}

/// Coordinates one orchestration run at a time per call; holds no state
/// between runs.
pub struct BatchOrchestrator {
    documents: Arc<dyn DocumentService>,
    compiler: Arc<dyn RequestCompiler>,
    executor: Arc<dyn StandaloneExecutor>,
    classifier: Arc<dyn FailureClassifier>,
    max_operations: usize,
    default_on_error: OnErrorMode,
}

impl BatchOrchestrator {
    /// Orchestrator backed by the operation registry.
    pub fn new(registry: Arc<OperationRegistry>) -> Self {
        let documents = registry.services().documents.clone();
        Self::from_parts(documents, registry.clone(), registry)
    }

    pub fn from_parts(
        documents: Arc<dyn DocumentService>,
        compiler: Arc<dyn RequestCompiler>,
        executor: Arc<dyn StandaloneExecutor>,
    ) -> Self {
        let defaults = BatchConfig::default();
        Self {
            documents,
            compiler,
            executor,
            classifier: Arc::new(StatusFirstClassifier),
            max_operations: defaults.max_operations,
            default_on_error: defaults.default_on_error,
        }
    }

    /// Apply the configured limits and default on-error mode.
    pub fn with_config(mut self, config: &BatchConfig) -> Self {
        self.max_operations = config.max_operations;
        self.default_on_error = config.default_on_error;
        self
    }

    /// Swap the failure classification used for standalone operations.
    pub fn with_failure_classifier(mut self, classifier: Arc<dyn FailureClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Execute one run.
    pub async fn run(
        &self,
        request: BatchRequest,
        ctx: &ToolContext,
    ) -> Result<ExecutionReport, BatchError> {
        let presentation_id = request.presentation_id.trim().to_string();
        if presentation_id.is_empty() {
            return Err(BatchError::MissingPresentationId);
        }
        if request.operations.is_empty() {
            return Err(BatchError::EmptyOperations);
        }
        if request.operations.len() > self.max_operations {
            return Err(BatchError::TooManyOperations {
                count: request.operations.len(),
                max: self.max_operations,
            });
        }
        let mode = match request.on_error.as_deref() {
            Some(raw) => raw
                .parse::<OnErrorMode>()
                .map_err(|_| BatchError::InvalidOnError(raw.to_string()))?,
            None => self.default_on_error,
        };

        let operations = LogicalOperation::from_specs(request.operations);
        tracing::info!(
            request_id = %ctx.request_id,
            presentation_id = %presentation_id,
            operations = operations.len(),
            mode = %mode,
            "Starting batch run"
        );

        let document = tokio::select! {
            biased;
            _ = ctx.cancellation.cancelled() => return Err(BatchError::Cancelled),
            fetched = self.documents.fetch(&ctx.credentials, &presentation_id) => {
                fetched.map_err(BatchError::DocumentUnavailable)?
            }
        };

        let compile_ctx = CompileContext {
            presentation_id: &presentation_id,
            document: &document,
        };
        let outcome = classify(&operations, self.compiler.as_ref(), &compile_ctx);
        let batchable_count = outcome.batchable.len();

        let mut state = RunState::new(mode, operations.iter().map(|op| op.kind.clone()).collect());

        self.record_invalid(&outcome, &mut state);

        executor::run_batch_phase(
            self.documents.as_ref(),
            &presentation_id,
            outcome.batchable,
            &mut state,
            ctx,
        )
        .await;

        executor::run_sequential_phase(
            self.executor.as_ref(),
            self.classifier.as_ref(),
            &presentation_id,
            &operations,
            &outcome.standalone,
            &mut state,
            ctx,
        )
        .await;

        let report = report::aggregate(state.finish(), batchable_count);
        tracing::info!(
            request_id = %ctx.request_id,
            presentation_id = %presentation_id,
            succeeded = report.success_count,
            failed = report.failure_count,
            api_calls = report.api_call_count,
            batch_optimized = report.batch_optimized,
            "Batch run finished"
        );
        Ok(report)
    }

    /// Record classification rejections.
    ///
    /// Under `stop` and `rollback` the first rejection closes the run before
    /// any write is sent; every other operation ends up skipped.
    fn record_invalid(&self, outcome: &ClassificationOutcome, state: &mut RunState) {
        if state.mode().halts_on_failure() {
            if let Some((index, rejection)) = outcome.first_invalid() {
                state.record_failure(index, rejection.code, rejection.message.clone());
            }
            return;
        }
        for (index, rejection) in &outcome.invalid {
            state.record_failure(*index, rejection.code, rejection.message.clone());
        }
    }
}
