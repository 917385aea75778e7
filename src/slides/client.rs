//! Google Slides API v1 client.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;

use crate::config::SlidesConfig;
use crate::error::ServiceError;
use crate::slides::{
    BatchUpdateResponse, Credentials, DocumentService, Presentation, WireRequest,
};

/// HTTP implementation of [`DocumentService`].
pub struct SlidesClient {
    client: Client,
    base_url: String,
}

impl SlidesClient {
    /// Create a client from configuration.
    pub fn new(config: &SlidesConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn presentation_url(&self, presentation_id: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(presentation_id))
    }
}

#[async_trait]
impl DocumentService for SlidesClient {
    async fn fetch(
        &self,
        credentials: &Credentials,
        presentation_id: &str,
    ) -> Result<Presentation, ServiceError> {
        let url = self.presentation_url(presentation_id);
        tracing::debug!("Slides API: GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", credentials.authorization_header())
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        parse_json(response).await
    }

    async fn execute_batch(
        &self,
        credentials: &Credentials,
        presentation_id: &str,
        requests: Vec<WireRequest>,
    ) -> Result<BatchUpdateResponse, ServiceError> {
        let url = format!("{}:batchUpdate", self.presentation_url(presentation_id));
        tracing::debug!(requests = requests.len(), "Slides API: POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", credentials.authorization_header())
            .json(&serde_json::json!({ "requests": requests }))
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        parse_json(response).await
    }
}

/// Google API error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Turn an HTTP response into either the decoded body or a structured
/// [`ServiceError`].
pub(crate) async fn parse_json<T>(response: Response) -> Result<T, ServiceError>
where
    T: for<'de> Deserialize<'de>,
{
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ServiceError::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(api_error(status.as_u16(), &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| ServiceError::InvalidResponse(format!("JSON parse error: {}", e)))
}

fn api_error(status: u16, body: &str) -> ServiceError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ServiceError::Api {
            status,
            reason: envelope.error.status,
            message: envelope.error.message,
        },
        Err(_) => ServiceError::Api {
            status,
            reason: None,
            message: body.chars().take(500).collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Seen {
        auth: Arc<Mutex<Vec<String>>>,
        bodies: Arc<Mutex<Vec<serde_json::Value>>>,
    }

    async fn get_deck(
        State(seen): State<Seen>,
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
        if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
            seen.auth.lock().unwrap().push(auth.to_string());
        }
        if id == "missing" {
            return Err((
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "error": {
                        "code": 404,
                        "message": "Requested entity was not found.",
                        "status": "NOT_FOUND"
                    }
                })),
            ));
        }
        Ok(Json(serde_json::json!({
            "presentationId": id,
            "title": "Deck",
            "slides": [{ "objectId": "s1" }]
        })))
    }

    async fn batch_update(
        State(seen): State<Seen>,
        Path(target): Path<String>,
        Json(body): Json<serde_json::Value>,
    ) -> (StatusCode, String) {
        seen.bodies.lock().unwrap().push(body.clone());
        let Some(id) = target.strip_suffix(":batchUpdate") else {
            return (StatusCode::NOT_FOUND, "no route".to_string());
        };
        let count = body["requests"].as_array().map(|a| a.len()).unwrap_or(0);
        let replies: Vec<serde_json::Value> = (0..count).map(|_| serde_json::json!({})).collect();
        (
            StatusCode::OK,
            serde_json::json!({ "presentationId": id, "replies": replies }).to_string(),
        )
    }

    async fn spawn_server(seen: Seen) -> String {
        let app = Router::new()
            .route("/v1/presentations/{id}", get(get_deck).post(batch_update))
            .with_state(seen);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1/presentations", addr)
    }

    fn client_for(base_url: String) -> SlidesClient {
        SlidesClient::new(&SlidesConfig {
            base_url,
            oauth_token: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_token() {
        let seen = Seen::default();
        let client = client_for(spawn_server(seen.clone()).await);
        let creds = Credentials::bearer("tok".to_string());

        let deck = client.fetch(&creds, "deck1").await.unwrap();
        assert_eq!(deck.presentation_id, "deck1");
        assert_eq!(deck.slides.len(), 1);
        assert_eq!(seen.auth.lock().unwrap().clone(), vec!["Bearer tok".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_maps_structured_error() {
        let client = client_for(spawn_server(Seen::default()).await);
        let creds = Credentials::bearer("tok".to_string());

        let err = client.fetch(&creds, "missing").await.unwrap_err();
        match err {
            ServiceError::Api {
                status,
                reason,
                message,
            } => {
                assert_eq!(status, 404);
                assert_eq!(reason.as_deref(), Some("NOT_FOUND"));
                assert_eq!(message, "Requested entity was not found.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_batch_posts_requests() {
        let seen = Seen::default();
        let client = client_for(spawn_server(seen.clone()).await);
        let creds = Credentials::bearer("tok".to_string());

        let requests = vec![
            serde_json::json!({ "deleteObject": { "objectId": "a" } }),
            serde_json::json!({ "deleteObject": { "objectId": "b" } }),
        ];
        let reply = client
            .execute_batch(&creds, "deck1", requests.clone())
            .await
            .unwrap();

        assert_eq!(reply.presentation_id, "deck1");
        assert_eq!(reply.replies.len(), 2);
        assert_eq!(
            seen.bodies.lock().unwrap()[0],
            serde_json::json!({ "requests": requests })
        );
    }

    #[test]
    fn test_api_error_without_envelope() {
        let err = api_error(502, "<html>Bad Gateway</html>");
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.reason(), None);
    }
}
