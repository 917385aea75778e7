//! Error types for slidekit.

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Missing required setting: {key}")]
    Missing { key: String },
}

/// Failures reported by the remote Slides or Translation service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    /// The service answered with a non-success HTTP status.
    ///
    /// `reason` holds the API's canonical status string (for example
    /// `NOT_FOUND` or `PERMISSION_DENIED`) when the error body carried one.
    #[error("API returned status {status}: {message}")]
    Api {
        status: u16,
        reason: Option<String>,
        message: String,
    },

    /// The request never produced an HTTP response.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The service answered but the body could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// HTTP status of the failure, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Canonical API status string, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            ServiceError::Api { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }
}

/// Request-level problems that abort an orchestration run before any
/// operation is processed.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("presentation_id is required")]
    MissingPresentationId,

    #[error("operations must contain at least one operation")]
    EmptyOperations,

    #[error("too many operations: {count} (max {max})")]
    TooManyOperations { count: usize, max: usize },

    #[error("invalid on_error value '{0}', expected 'stop', 'continue', or 'rollback'")]
    InvalidOnError(String),

    #[error("presentation could not be loaded: {0}")]
    DocumentUnavailable(#[source] ServiceError),

    #[error("run cancelled before any operation was dispatched")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_accessors() {
        let err = ServiceError::Api {
            status: 404,
            reason: Some("NOT_FOUND".to_string()),
            message: "Requested entity was not found.".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.reason(), Some("NOT_FOUND"));

        let err = ServiceError::Transport("connection reset".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(err.reason(), None);
    }

    #[test]
    fn test_batch_error_messages() {
        let err = BatchError::TooManyOperations { count: 120, max: 100 };
        assert_eq!(err.to_string(), "too many operations: 120 (max 100)");

        let err = BatchError::InvalidOnError("abort".to_string());
        assert!(err.to_string().contains("'abort'"));
    }
}
