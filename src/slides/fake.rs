//! In-memory service doubles for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::slides::{
    BatchUpdateResponse, Credentials, DocumentService, Presentation, TranslationService,
    WireReply, WireRequest,
};

/// A recorded `execute_batch` call.
#[derive(Debug, Clone)]
pub struct RecordedBatch {
    pub presentation_id: String,
    pub requests: Vec<WireRequest>,
}

/// Scripted [`DocumentService`].
///
/// `fetch` returns the configured snapshot (or error). Each
/// `execute_batch` pops the next scripted outcome; when the script is
/// empty it echoes one `{}` reply per request.
pub struct FakeDocuments {
    snapshot: Mutex<Result<Presentation, ServiceError>>,
    outcomes: Mutex<VecDeque<Result<Vec<WireReply>, ServiceError>>>,
    batches: Mutex<Vec<RecordedBatch>>,
    fetches: Mutex<usize>,
}

impl FakeDocuments {
    pub fn new(snapshot: Presentation) -> Self {
        Self {
            snapshot: Mutex::new(Ok(snapshot)),
            outcomes: Mutex::new(VecDeque::new()),
            batches: Mutex::new(Vec::new()),
            fetches: Mutex::new(0),
        }
    }

    /// A deck with the given slide ids and no elements.
    pub fn with_slides(ids: &[&str]) -> Self {
        let snapshot: Presentation = serde_json::from_value(serde_json::json!({
            "presentationId": "deck1",
            "slides": ids.iter().map(|id| serde_json::json!({ "objectId": id })).collect::<Vec<_>>(),
        }))
        .unwrap_or_default();
        Self::new(snapshot)
    }

    pub fn failing_fetch(err: ServiceError) -> Self {
        let fake = Self::new(Presentation::default());
        *fake.snapshot.lock().unwrap() = Err(err);
        fake
    }

    /// Queue the replies for the next `execute_batch` call.
    pub fn push_replies(&self, replies: Vec<WireReply>) {
        self.outcomes.lock().unwrap().push_back(Ok(replies));
    }

    /// Queue a failure for the next `execute_batch` call.
    pub fn push_failure(&self, err: ServiceError) {
        self.outcomes.lock().unwrap().push_back(Err(err));
    }

    pub fn batches(&self) -> Vec<RecordedBatch> {
        self.batches.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl DocumentService for FakeDocuments {
    async fn fetch(
        &self,
        _credentials: &Credentials,
        _presentation_id: &str,
    ) -> Result<Presentation, ServiceError> {
        *self.fetches.lock().unwrap() += 1;
        self.snapshot.lock().unwrap().clone()
    }

    async fn execute_batch(
        &self,
        _credentials: &Credentials,
        presentation_id: &str,
        requests: Vec<WireRequest>,
    ) -> Result<BatchUpdateResponse, ServiceError> {
        let count = requests.len();
        self.batches.lock().unwrap().push(RecordedBatch {
            presentation_id: presentation_id.to_string(),
            requests,
        });

        let next = self.outcomes.lock().unwrap().pop_front();
        let replies = match next {
            Some(outcome) => outcome?,
            None => vec![serde_json::json!({}); count],
        };
        Ok(BatchUpdateResponse {
            presentation_id: presentation_id.to_string(),
            replies,
        })
    }
}

/// [`TranslationService`] that tags each text with the target language.
#[derive(Default)]
pub struct FakeTranslator {
    pub calls: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl TranslationService for FakeTranslator {
    async fn translate(
        &self,
        _credentials: &Credentials,
        texts: &[String],
        target_language: &str,
        _source_language: Option<&str>,
    ) -> Result<Vec<String>, ServiceError> {
        self.calls.lock().unwrap().push(texts.to_vec());
        Ok(texts
            .iter()
            .map(|t| format!("[{}] {}", target_language, t))
            .collect())
    }
}

pub fn test_credentials() -> Credentials {
    Credentials::bearer("test-token".to_string())
}
