//! Per-call execution context.

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::slides::Credentials;

/// Context handed to every tool and orchestration run.
///
/// Carries the caller's credentials and a cancellation token. Runs check
/// the token before each remote call and race in-flight calls against it.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Correlates log lines of one call.
    pub request_id: Uuid,
    /// Authorization used for remote calls.
    pub credentials: Credentials,
    /// Cooperative cancellation for the whole call.
    pub cancellation: CancellationToken,
}

impl ToolContext {
    /// Create a context with a fresh request id and cancellation token.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            credentials,
            cancellation: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Whether the caller asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
