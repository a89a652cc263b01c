//! reqwest implementation of [`ChatBackend`]

use async_trait::async_trait;
use ncuacg_chat_core::config::AssistantConfig;
use ncuacg_chat_core::utils::{ensure_slash, truncate};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::base::{
    BackendError, BackendResult, ChatBackend, ChatReply, ChatRequest, RejectionBody,
    RemotePersona,
};

/// Longest error body carried into diagnostics
const MAX_ERROR_BODY: usize = 500;

/// HTTP client for the assistant endpoints
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: Client,
    chat_url: String,
    personas_url: String,
}

impl HttpChatBackend {
    /// Create a client for explicit endpoints
    pub fn new(
        chat_url: impl AsRef<str>,
        personas_url: impl AsRef<str>,
        timeout: Duration,
    ) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            chat_url: ensure_slash(chat_url.as_ref()),
            personas_url: ensure_slash(personas_url.as_ref()),
        })
    }

    /// Create a client from the assistant section of the configuration
    pub fn from_config(config: &AssistantConfig) -> BackendResult<Self> {
        Self::new(
            config.chat_endpoint(),
            config.personas_endpoint(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    pub fn personas_url(&self) -> &str {
        &self.personas_url
    }

    async fn error_body(response: reqwest::Response) -> String {
        let text = response.text().await.unwrap_or_default();
        truncate(text.trim(), MAX_ERROR_BODY)
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, request: ChatRequest) -> BackendResult<ChatReply> {
        if self.chat_url.is_empty() {
            return Err(BackendError::Config(
                "chat endpoint is not configured".to_string(),
            ));
        }

        debug!(
            "Sending chat request to {} (persona: {:?}, conversation: {:?})",
            self.chat_url, request.persona, request.conversation_id
        );

        let response = self
            .client
            .post(&self.chat_url)
            .json(&request)
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::BAD_REQUEST {
            let text = response.text().await.unwrap_or_default();
            let body: RejectionBody = serde_json::from_str(&text).unwrap_or_default();
            let detail = body
                .detail
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| "Bad Request".to_string());
            warn!("Chat request rejected: {}", detail);
            return Err(BackendError::Rejected {
                detail,
                available_personas: body.available_personas,
            });
        }

        if !status.is_success() {
            let body = Self::error_body(response).await;
            warn!("Chat request failed with HTTP {}", status);
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let reply: ChatReply = serde_json::from_str(&text)?;
        Ok(reply)
    }

    async fn list_personas(&self) -> BackendResult<Vec<RemotePersona>> {
        if self.personas_url.is_empty() {
            return Err(BackendError::Config(
                "personas endpoint is not configured".to_string(),
            ));
        }

        let response = self.client.get(&self.personas_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                body: Self::error_body(response).await,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn backend_for(server: &mockito::ServerGuard) -> HttpChatBackend {
        HttpChatBackend::new(
            format!("{}/api/assistant/chat", server.url()),
            format!("{}/api/assistant/personas", server.url()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_from_config_normalizes_endpoints() {
        let config = AssistantConfig {
            base_url: "https://club.example/api/assistant".to_string(),
            ..AssistantConfig::default()
        };
        let backend = HttpChatBackend::from_config(&config).unwrap();
        assert_eq!(
            backend.chat_url(),
            "https://club.example/api/assistant/chat/"
        );
        assert_eq!(
            backend.personas_url(),
            "https://club.example/api/assistant/personas/"
        );
    }

    #[tokio::test]
    async fn test_send_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/assistant/chat/")
            .match_body(Matcher::Json(json!({
                "message": "Hello",
                "persona": "starter_guide",
                "conversation_id": "c1"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"reply":"Hi there","conversation_id":"c2","persona":"starter_guide"}"#)
            .create_async()
            .await;

        let reply = backend_for(&server)
            .send(
                ChatRequest::new("Hello")
                    .with_persona(Some("starter_guide".to_string()))
                    .with_conversation(Some("c1".to_string())),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply.reply, "Hi there");
        assert_eq!(reply.effective_conversation(), Some("c2"));
    }

    #[tokio::test]
    async fn test_send_rejected_persona() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/assistant/chat/")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"detail":"Unknown persona 'ghost'","available_personas":[{"id":"p1","name":"P One"}]}"#,
            )
            .create_async()
            .await;

        let err = backend_for(&server)
            .send(ChatRequest::new("Hello").with_persona(Some("ghost".to_string())))
            .await
            .unwrap_err();

        match err {
            BackendError::Rejected {
                detail,
                available_personas,
            } => {
                assert_eq!(detail, "Unknown persona 'ghost'");
                assert_eq!(available_personas.len(), 1);
                assert_eq!(available_personas[0].id, "p1");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_rejected_without_json_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/assistant/chat/")
            .with_status(400)
            .with_body("nope")
            .create_async()
            .await;

        let err = backend_for(&server)
            .send(ChatRequest::new("Hello"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Bad Request");
    }

    #[tokio::test]
    async fn test_send_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/assistant/chat/")
            .with_status(500)
            .with_body(r#"{"detail":"Internal Server Error"}"#)
            .create_async()
            .await;

        let err = backend_for(&server)
            .send(ChatRequest::new("Hello"))
            .await
            .unwrap_err();
        match err {
            BackendError::Api { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("Internal Server Error"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_malformed_reply() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/assistant/chat/")
            .with_status(200)
            .with_body(r#"{"answer":"wrong shape"}"#)
            .create_async()
            .await;

        let err = backend_for(&server)
            .send(ChatRequest::new("Hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Json(_)));
    }

    #[tokio::test]
    async fn test_send_without_endpoint() {
        let backend = HttpChatBackend::new("", "", Duration::from_secs(1)).unwrap();
        let err = backend.send(ChatRequest::new("Hello")).await.unwrap_err();
        assert!(matches!(err, BackendError::Config(_)));
    }

    #[tokio::test]
    async fn test_list_personas() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/assistant/personas/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"id":"weekend_curator","name":"週末策展人","avatar":null,"description":"本週精選"}]"#,
            )
            .create_async()
            .await;

        let personas = backend_for(&server).list_personas().await.unwrap();
        assert_eq!(personas.len(), 1);
        assert_eq!(personas[0].name, "週末策展人");
        assert_eq!(personas[0].description.as_deref(), Some("本週精選"));
    }
}
