//! Remote Slides and Translation services.
//!
//! The orchestrator and the operation handlers only see the capability
//! traits defined here; [`SlidesClient`] and [`TranslateClient`] are the
//! HTTP implementations.

mod auth;
mod client;
pub mod document;
mod translate;

#[cfg(test)]
pub(crate) mod fake;

pub use auth::Credentials;
pub use client::SlidesClient;
pub use document::{ElementKind, Page, PageElement, Presentation};
pub use translate::TranslateClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// One remote edit instruction, in the API's own JSON shape
/// (e.g. `{"createSlide": {...}}`).
pub type WireRequest = serde_json::Value;

/// One entry of a batch reply, positionally matching its request.
pub type WireReply = serde_json::Value;

/// Reply of a `batchUpdate` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub presentation_id: String,
    #[serde(default)]
    pub replies: Vec<WireReply>,
}

/// Access to presentation documents.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Fetch the current snapshot of a presentation.
    async fn fetch(
        &self,
        credentials: &Credentials,
        presentation_id: &str,
    ) -> Result<Presentation, ServiceError>;

    /// Apply a list of requests in one call. The remote service applies
    /// all of them or none.
    async fn execute_batch(
        &self,
        credentials: &Credentials,
        presentation_id: &str,
        requests: Vec<WireRequest>,
    ) -> Result<BatchUpdateResponse, ServiceError>;
}

/// Machine translation of plain text.
#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Translate each input string, preserving order.
    async fn translate(
        &self,
        credentials: &Credentials,
        texts: &[String],
        target_language: &str,
        source_language: Option<&str>,
    ) -> Result<Vec<String>, ServiceError>;
}
