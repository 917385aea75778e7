//! Google Cloud Translation (v2 REST) client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::TranslateConfig;
use crate::error::ServiceError;
use crate::slides::client::parse_json;
use crate::slides::{Credentials, TranslationService};

/// HTTP implementation of [`TranslationService`].
pub struct TranslateClient {
    client: Client,
    base_url: String,
}

impl TranslateClient {
    pub fn new(config: &TranslateConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a [String],
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

#[async_trait]
impl TranslationService for TranslateClient {
    async fn translate(
        &self,
        credentials: &Credentials,
        texts: &[String],
        target_language: &str,
        source_language: Option<&str>,
    ) -> Result<Vec<String>, ServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            count = texts.len(),
            target = target_language,
            "Translation API: POST {}",
            self.base_url
        );

        let body = TranslateRequest {
            q: texts,
            target: target_language,
            source: source_language,
            format: "text",
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", credentials.authorization_header())
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let parsed: TranslateResponse = parse_json(response).await?;
        if parsed.data.translations.len() != texts.len() {
            return Err(ServiceError::InvalidResponse(format!(
                "expected {} translations, got {}",
                texts.len(),
                parsed.data.translations.len()
            )));
        }

        Ok(parsed
            .data
            .translations
            .into_iter()
            .map(|t| t.translated_text)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::routing::post;
    use axum::{Json, Router};

    use super::*;

    async fn spawn_server() -> String {
        async fn handler(Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
            let translations: Vec<serde_json::Value> = body["q"]
                .as_array()
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(|q| {
                    let text = q.as_str().unwrap_or_default().to_uppercase();
                    serde_json::json!({ "translatedText": format!("{}@{}", text, body["target"].as_str().unwrap_or("")) })
                })
                .collect();
            Json(serde_json::json!({ "data": { "translations": translations } }))
        }

        let app = Router::new().route("/language/translate/v2", post(handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/language/translate/v2", addr)
    }

    #[tokio::test]
    async fn test_translate_preserves_order() {
        let client = TranslateClient::new(&TranslateConfig {
            base_url: spawn_server().await,
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let creds = Credentials::bearer("tok".to_string());

        let out = client
            .translate(&creds, &["hola".to_string(), "mundo".to_string()], "en", None)
            .await
            .unwrap();
        assert_eq!(out, vec!["HOLA@en".to_string(), "MUNDO@en".to_string()]);
    }

    #[tokio::test]
    async fn test_translate_empty_input_skips_call() {
        let client = TranslateClient::new(&TranslateConfig {
            base_url: "http://127.0.0.1:1/unreachable".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        let creds = Credentials::bearer("tok".to_string());

        let out = client.translate(&creds, &[], "en", None).await.unwrap();
        assert!(out.is_empty());
    }
}
