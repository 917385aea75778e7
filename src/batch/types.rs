//! Request and report types of an orchestration run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What to do with the rest of the run after an operation fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnErrorMode {
    /// Skip everything not yet attempted.
    #[default]
    Stop,
    /// Record the failure and keep going.
    Continue,
    /// Like `Stop`, and report what could not be undone.
    Rollback,
}

impl OnErrorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnErrorMode::Stop => "stop",
            OnErrorMode::Continue => "continue",
            OnErrorMode::Rollback => "rollback",
        }
    }

    /// Whether a failure ends the run.
    pub fn halts_on_failure(&self) -> bool {
        !matches!(self, OnErrorMode::Continue)
    }
}

impl FromStr for OnErrorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stop" => Ok(OnErrorMode::Stop),
            "continue" => Ok(OnErrorMode::Continue),
            "rollback" => Ok(OnErrorMode::Rollback),
            _ => Err(format!(
                "invalid on_error mode '{}', expected 'stop', 'continue', or 'rollback'",
                s
            )),
        }
    }
}

impl fmt::Display for OnErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn empty_object() -> serde_json::Value {
    serde_json::json!({})
}

/// One operation as submitted by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSpec {
    pub kind: String,
    #[serde(default = "empty_object")]
    pub parameters: serde_json::Value,
}

/// Input of one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub presentation_id: String,
    pub operations: Vec<OperationSpec>,
    /// `stop`, `continue` or `rollback`. Unset uses the configured default.
    #[serde(default)]
    pub on_error: Option<String>,
}

/// An operation tagged with its position in the caller's list.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalOperation {
    pub index: usize,
    pub kind: String,
    pub parameters: serde_json::Value,
}

impl LogicalOperation {
    pub fn from_specs(specs: Vec<OperationSpec>) -> Vec<Self> {
        specs
            .into_iter()
            .enumerate()
            .map(|(index, spec)| Self {
                index,
                kind: spec.kind,
                parameters: spec.parameters,
            })
            .collect()
    }
}

/// Machine-readable failure code of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Not attempted because an earlier failure closed the run.
    Skipped,
    /// Not attempted, or outcome unknown, because the caller cancelled.
    Cancelled,
    /// The aggregated call failed; none of its requests were applied.
    BatchError,
    /// The write succeeded but its replies could not be interpreted.
    PostProcessError,
    ParseError,
    InvalidOperation,
    PresentationNotFound,
    AccessDenied,
    RateLimited,
    ObjectNotFound,
    OperationFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Skipped => "SKIPPED",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::BatchError => "BATCH_ERROR",
            ErrorCode::PostProcessError => "POST_PROCESS_ERROR",
            ErrorCode::ParseError => "PARSE_ERROR",
            ErrorCode::InvalidOperation => "INVALID_OPERATION",
            ErrorCode::PresentationNotFound => "PRESENTATION_NOT_FOUND",
            ErrorCode::AccessDenied => "ACCESS_DENIED",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::ObjectNotFound => "OBJECT_NOT_FOUND",
            ErrorCode::OperationFailed => "OPERATION_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one operation. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub index: usize,
    pub kind: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
}

impl OperationResult {
    pub fn success(index: usize, kind: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            index,
            kind: kind.into(),
            success: true,
            result: Some(result),
            error: None,
            error_code: None,
        }
    }

    pub fn failure(
        index: usize,
        kind: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            index,
            kind: kind.into(),
            success: false,
            result: None,
            error: Some(message.into()),
            error_code: Some(code),
        }
    }
}

/// Final report of an orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub total_operations: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// One entry per submitted operation, ordered by index.
    pub results: Vec<OperationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at_index: Option<usize>,
    pub rolled_back: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_error: Option<String>,
    pub api_call_count: usize,
    pub batch_optimized: bool,
    pub cancelled: bool,
}
