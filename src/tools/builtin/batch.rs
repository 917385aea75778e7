//! `batch_operations`: many operations, few round trips.

use std::sync::Arc;

use async_trait::async_trait;

use crate::batch::{BatchOrchestrator, BatchRequest};
use crate::context::ToolContext;
use crate::error::BatchError;
use crate::ops::OperationKind;
use crate::tools::tool::{Tool, ToolError, ToolOutput};

/// Tool front end of the [`BatchOrchestrator`].
pub struct BatchOperationsTool {
    orchestrator: Arc<BatchOrchestrator>,
}

impl BatchOperationsTool {
    pub fn new(orchestrator: Arc<BatchOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

impl From<BatchError> for ToolError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::DocumentUnavailable(e) => ToolError::Service(e),
            BatchError::Cancelled => ToolError::Cancelled,
            other => ToolError::InvalidParameters(other.to_string()),
        }
    }
}

#[async_trait]
impl Tool for BatchOperationsTool {
    fn name(&self) -> &str {
        "batch_operations"
    }

    fn description(&self) -> &str {
        "Run several slide operations in one request. Operations that can be expressed \
         ahead of time are sent in a single API call; the rest run one by one in order. \
         on_error controls what happens after a failure: 'stop' skips the remaining \
         operations, 'continue' runs everything, 'rollback' stops and reports what could \
         not be undone."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        let kinds: Vec<&str> = OperationKind::ALL.iter().map(|k| k.as_str()).collect();
        serde_json::json!({
            "type": "object",
            "properties": {
                "presentation_id": {
                    "type": "string",
                    "description": "ID of the presentation to edit"
                },
                "operations": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "properties": {
                            "kind": {
                                "type": "string",
                                "enum": kinds,
                                "description": "Operation to run"
                            },
                            "parameters": {
                                "type": "object",
                                "description": "Parameters of the operation, as for its own tool, without presentation_id"
                            }
                        },
                        "required": ["kind"]
                    }
                },
                "on_error": {
                    "type": "string",
                    "enum": ["stop", "continue", "rollback"],
                    "description": "Failure policy (default stop)"
                }
            },
            "required": ["presentation_id", "operations"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = std::time::Instant::now();

        let request: BatchRequest = serde_json::from_value(params)
            .map_err(|e| ToolError::InvalidParameters(format!("invalid batch request: {}", e)))?;

        let report = self.orchestrator.run(request, ctx).await?;
        let result = serde_json::to_value(&report)
            .map_err(|e| ToolError::ExecutionFailed(format!("failed to serialize report: {}", e)))?;

        Ok(ToolOutput::success(result, start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ops::{OperationRegistry, OperationServices};
    use crate::slides::fake::{FakeDocuments, FakeTranslator, test_credentials};

    fn tool(docs: Arc<FakeDocuments>) -> BatchOperationsTool {
        let operations = Arc::new(OperationRegistry::new(OperationServices {
            documents: docs,
            translator: Arc::new(FakeTranslator::default()),
        }));
        BatchOperationsTool::new(Arc::new(BatchOrchestrator::new(operations)))
    }

    #[tokio::test]
    async fn test_report_is_serialized() {
        let docs = Arc::new(FakeDocuments::with_slides(&["s_0"]));
        let ctx = ToolContext::new(test_credentials());

        let output = tool(docs)
            .execute(
                serde_json::json!({
                    "presentation_id": "deck1",
                    "operations": [
                        { "kind": "create_slide" },
                        { "kind": "replace_all_text", "parameters": { "find": "a", "replace": "b" } }
                    ]
                }),
                &ctx,
            )
            .await
            .unwrap();

        let report = &output.result;
        assert_eq!(report["total_operations"], 2);
        assert_eq!(report["success_count"], 2);
        assert_eq!(report["api_call_count"], 1);
        assert_eq!(report["batch_optimized"], true);
        assert_eq!(report["cancelled"], false);
        assert_eq!(report["results"][1]["result"]["occurrences_changed"], 0);
    }

    #[tokio::test]
    async fn test_request_errors_are_invalid_parameters() {
        let docs = Arc::new(FakeDocuments::with_slides(&[]));
        let ctx = ToolContext::new(test_credentials());

        let err = tool(docs.clone())
            .execute(
                serde_json::json!({ "presentation_id": "deck1", "operations": [] }),
                &ctx,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameters(ref m) if m.contains("at least one")));

        let err = tool(docs)
            .execute(serde_json::json!({ "operations": [] }), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameters(_)));
    }
}
