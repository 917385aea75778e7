//! Partition a run's operations into batchable, standalone and invalid.

use std::collections::BTreeMap;

use crate::batch::RequestCompiler;
use crate::batch::types::{ErrorCode, LogicalOperation};
use crate::ops::{CompileContext, Compilation, CompiledRequests, OperationKind, ValidationError};

/// A batchable operation and its compiled requests.
#[derive(Debug)]
pub struct CompiledOperation {
    pub index: usize,
    pub kind: OperationKind,
    pub compiled: CompiledRequests,
}

/// A valid operation that runs through its standalone handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandaloneOperation {
    pub index: usize,
    pub kind: OperationKind,
}

/// Why an operation was rejected at classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub code: ErrorCode,
    pub message: String,
}

impl From<ValidationError> for Rejection {
    fn from(err: ValidationError) -> Self {
        let code = match err {
            ValidationError::Parse(_) => ErrorCode::ParseError,
            ValidationError::UnknownKind(_) | ValidationError::Invalid(_) => {
                ErrorCode::InvalidOperation
            }
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

/// Three disjoint buckets covering every input index once. Both execution
/// buckets are in ascending index order.
#[derive(Debug, Default)]
pub struct ClassificationOutcome {
    pub batchable: Vec<CompiledOperation>,
    pub standalone: Vec<StandaloneOperation>,
    pub invalid: BTreeMap<usize, Rejection>,
}

impl ClassificationOutcome {
    /// Lowest invalid index, if any.
    pub fn first_invalid(&self) -> Option<(usize, &Rejection)> {
        self.invalid.iter().next().map(|(i, r)| (*i, r))
    }
}

pub fn classify(
    operations: &[LogicalOperation],
    compiler: &dyn RequestCompiler,
    ctx: &CompileContext<'_>,
) -> ClassificationOutcome {
    let mut outcome = ClassificationOutcome::default();

    for op in operations {
        let kind = match op.kind.parse::<OperationKind>() {
            Ok(kind) => kind,
            Err(e) => {
                tracing::debug!(index = op.index, kind = %op.kind, "Unknown operation kind");
                outcome.invalid.insert(op.index, e.into());
                continue;
            }
        };

        match compiler.compile(kind, &op.parameters, ctx) {
            Compilation::Invalid(e) => {
                tracing::debug!(index = op.index, kind = %kind, error = %e, "Operation rejected");
                outcome.invalid.insert(op.index, e.into());
            }
            Compilation::Unsupported => {
                tracing::debug!(index = op.index, kind = %kind, "Operation runs standalone");
                outcome.standalone.push(StandaloneOperation {
                    index: op.index,
                    kind,
                });
            }
            Compilation::Compiled(compiled) if compiled.requests.is_empty() => {
                tracing::debug!(
                    index = op.index,
                    kind = %kind,
                    "Operation compiled to no requests, running standalone"
                );
                outcome.standalone.push(StandaloneOperation {
                    index: op.index,
                    kind,
                });
            }
            Compilation::Compiled(compiled) => {
                tracing::debug!(
                    index = op.index,
                    kind = %kind,
                    requests = compiled.requests.len(),
                    "Operation batched"
                );
                outcome.batchable.push(CompiledOperation {
                    index: op.index,
                    kind,
                    compiled,
                });
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ops;
    use crate::slides::Presentation;

    struct Registry;

    impl RequestCompiler for Registry {
        fn compile(
            &self,
            kind: OperationKind,
            params: &serde_json::Value,
            ctx: &CompileContext<'_>,
        ) -> Compilation {
            ops::compile(kind, params, ctx)
        }
    }

    fn op(index: usize, kind: &str, parameters: serde_json::Value) -> LogicalOperation {
        LogicalOperation {
            index,
            kind: kind.to_string(),
            parameters,
        }
    }

    #[test]
    fn test_every_index_lands_in_exactly_one_bucket() {
        let deck = Presentation::default();
        let ctx = CompileContext {
            presentation_id: "deck1",
            document: &deck,
        };
        let operations = vec![
            op(0, "create_slide", serde_json::json!({})),
            op(1, "delete_slide_at", serde_json::json!({ "position": 0 })),
            op(2, "frobnicate", serde_json::json!({})),
            op(3, "delete_object", serde_json::json!({ "object_id": 7 })),
            op(4, "insert_text", serde_json::json!({ "object_id": "box_1", "text": "" })),
            op(5, "move_slides", serde_json::json!({ "slide_object_ids": [], "insertion_index": 0 })),
            op(6, "delete_object", serde_json::json!({ "object_id": "shape_1" })),
        ];

        let outcome = classify(&operations, &Registry, &ctx);

        let batchable: Vec<usize> = outcome.batchable.iter().map(|c| c.index).collect();
        let standalone: Vec<usize> = outcome.standalone.iter().map(|s| s.index).collect();
        let invalid: Vec<usize> = outcome.invalid.keys().copied().collect();
        assert_eq!(batchable, vec![0, 6]);
        assert_eq!(standalone, vec![1, 4]);
        assert_eq!(invalid, vec![2, 3, 5]);

        assert_eq!(outcome.invalid[&2].code, ErrorCode::InvalidOperation);
        assert_eq!(outcome.invalid[&3].code, ErrorCode::ParseError);
        assert_eq!(outcome.invalid[&5].code, ErrorCode::InvalidOperation);
        assert_eq!(outcome.first_invalid().map(|(i, _)| i), Some(2));
    }
}
