//! Mapping of standalone-handler failures to result codes.
//!
//! Structured status (HTTP code, canonical reason) wins. Message text is
//! only consulted when the failure carries no status at all.

use std::sync::LazyLock;

use regex::Regex;

use crate::batch::types::ErrorCode;
use crate::error::ServiceError;
use crate::tools::ToolError;

/// Turns a handler failure into a result code.
pub trait FailureClassifier: Send + Sync {
    fn classify(&self, err: &ToolError) -> ErrorCode;
}

/// Status first, message heuristics as a last resort.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusFirstClassifier;

static NOT_FOUND_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(not[ _]found|does not exist|no such)\b").expect("valid regex")
});
static DENIED_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(forbidden|permission|unauthori[sz]ed|unauthenticated|access denied)\b")
        .expect("valid regex")
});
static RATE_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(rate[ _-]?limit|quota|too many requests|resource[ _]exhausted)")
        .expect("valid regex")
});

impl FailureClassifier for StatusFirstClassifier {
    fn classify(&self, err: &ToolError) -> ErrorCode {
        match err {
            ToolError::InvalidParameters(_) => ErrorCode::InvalidOperation,
            ToolError::ObjectNotFound(_) => ErrorCode::ObjectNotFound,
            ToolError::PostProcess(_) => ErrorCode::PostProcessError,
            ToolError::Cancelled => ErrorCode::Cancelled,
            ToolError::ExecutionFailed(_) => ErrorCode::OperationFailed,
            ToolError::Service(service) => classify_service(service),
        }
    }
}

fn classify_service(err: &ServiceError) -> ErrorCode {
    match err {
        ServiceError::Api { status, reason, .. } => {
            from_status(*status, reason.as_deref()).unwrap_or(ErrorCode::OperationFailed)
        }
        ServiceError::Transport(message) | ServiceError::InvalidResponse(message) => {
            from_message(message)
        }
    }
}

fn from_status(status: u16, reason: Option<&str>) -> Option<ErrorCode> {
    match reason {
        Some("NOT_FOUND") => return Some(ErrorCode::PresentationNotFound),
        Some("PERMISSION_DENIED") | Some("UNAUTHENTICATED") => {
            return Some(ErrorCode::AccessDenied);
        }
        Some("RESOURCE_EXHAUSTED") => return Some(ErrorCode::RateLimited),
        _ => {}
    }
    match status {
        404 => Some(ErrorCode::PresentationNotFound),
        401 | 403 => Some(ErrorCode::AccessDenied),
        429 => Some(ErrorCode::RateLimited),
        _ => None,
    }
}

fn from_message(message: &str) -> ErrorCode {
    if NOT_FOUND_TEXT.is_match(message) {
        ErrorCode::PresentationNotFound
    } else if DENIED_TEXT.is_match(message) {
        ErrorCode::AccessDenied
    } else if RATE_TEXT.is_match(message) {
        ErrorCode::RateLimited
    } else {
        ErrorCode::OperationFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, reason: Option<&str>, message: &str) -> ToolError {
        ToolError::Service(ServiceError::Api {
            status,
            reason: reason.map(str::to_string),
            message: message.to_string(),
        })
    }

    #[test]
    fn test_structured_status_wins_over_text() {
        let classifier = StatusFirstClassifier;
        assert_eq!(
            classifier.classify(&api(403, None, "Requested entity was not found.")),
            ErrorCode::AccessDenied
        );
        assert_eq!(
            classifier.classify(&api(400, Some("NOT_FOUND"), "bad")),
            ErrorCode::PresentationNotFound
        );
        assert_eq!(classifier.classify(&api(429, None, "slow down")), ErrorCode::RateLimited);
        assert_eq!(
            classifier.classify(&api(400, Some("INVALID_ARGUMENT"), "permission text")),
            ErrorCode::OperationFailed
        );
    }

    #[test]
    fn test_text_fallback_without_status() {
        let classifier = StatusFirstClassifier;
        let transport = |m: &str| ToolError::Service(ServiceError::Transport(m.to_string()));
        assert_eq!(
            classifier.classify(&transport("presentation does not exist")),
            ErrorCode::PresentationNotFound
        );
        assert_eq!(classifier.classify(&transport("403 Forbidden")), ErrorCode::AccessDenied);
        assert_eq!(
            classifier.classify(&transport("Quota exceeded for project")),
            ErrorCode::RateLimited
        );
        assert_eq!(
            classifier.classify(&transport("connection reset by peer")),
            ErrorCode::OperationFailed
        );
    }

    #[test]
    fn test_tool_error_variants() {
        let classifier = StatusFirstClassifier;
        assert_eq!(
            classifier.classify(&ToolError::InvalidParameters("x".to_string())),
            ErrorCode::InvalidOperation
        );
        assert_eq!(
            classifier.classify(&ToolError::ObjectNotFound("x".to_string())),
            ErrorCode::ObjectNotFound
        );
        assert_eq!(classifier.classify(&ToolError::Cancelled), ErrorCode::Cancelled);
    }
}
