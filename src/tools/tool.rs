//! Tool trait and types.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::ToolContext;
use crate::error::ServiceError;
use crate::ops::ValidationError;

/// Error type for tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("External service error: {0}")]
    Service(#[from] ServiceError),

    /// The write was applied but its replies could not be interpreted.
    #[error("Result extraction failed: {0}")]
    PostProcess(String),

    #[error("Cancelled")]
    Cancelled,
}

impl From<ValidationError> for ToolError {
    fn from(err: ValidationError) -> Self {
        ToolError::InvalidParameters(err.to_string())
    }
}

/// Output from a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The result data.
    pub result: serde_json::Value,
    /// Time taken.
    pub duration: Duration,
}

impl ToolOutput {
    /// Create a successful output with a JSON result.
    pub fn success(result: serde_json::Value, duration: Duration) -> Self {
        Self { result, duration }
    }
}

/// Definition of a tool's parameters using JSON Schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A callable slide-deck tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name.
    fn name(&self) -> &str;

    /// Get a description of what the tool does.
    fn description(&self) -> &str;

    /// Get the JSON Schema for the tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given parameters.
    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError>;

    /// Get the tool schema for function calling.
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_become_invalid_parameters() {
        let err: ToolError = ValidationError::Invalid("rows must be at least 1".to_string()).into();
        assert!(matches!(err, ToolError::InvalidParameters(ref m) if m == "rows must be at least 1"));
    }

    #[test]
    fn test_service_errors_keep_status() {
        let err: ToolError = ServiceError::Api {
            status: 404,
            reason: Some("NOT_FOUND".to_string()),
            message: "Requested entity was not found.".to_string(),
        }
        .into();
        match err {
            ToolError::Service(inner) => assert_eq!(inner.status(), Some(404)),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
