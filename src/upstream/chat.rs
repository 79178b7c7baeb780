use super::client::UpstreamHttpClient;
use super::ChatService;
use crate::config::Config;
use crate::models::{ChatGenerateRequest, ChatGenerateResponse};
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

pub const FALLBACK_REPLY: &str = "Sorry, I couldn't generate a response.";

/// Client for an Ollama-compatible `/api/generate` endpoint (non-streaming).
pub struct OllamaChatClient {
    http: UpstreamHttpClient,
    model: String,
}

impl OllamaChatClient {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Self {
        Self::new_with_client(base_url, model, timeout, reqwest::Client::new())
    }

    pub fn new_with_client(
        base_url: String,
        model: String,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: UpstreamHttpClient::new_with_client("Chat upstream", base_url, timeout, client),
            model,
        }
    }

    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        Self::new_with_client(
            config.chat_base_url.clone(),
            config.chat_model.clone(),
            config.chat_timeout,
            client,
        )
    }
}

#[async_trait]
impl ChatService for OllamaChatClient {
    async fn chat(&self, prompt: &str) -> Result<String> {
        tracing::debug!("Sending chat request to {} (model: {})", self.http.base_url(), self.model);

        let request = ChatGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response: ChatGenerateResponse = self.http.post_json_for("/api/generate", &request).await?;

        Ok(response
            .response
            .unwrap_or_else(|| FALLBACK_REPLY.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer) -> OllamaChatClient {
        OllamaChatClient::new(server.uri(), "mistral".to_string(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_chat_parses_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_json(serde_json::json!({
                "model": "mistral",
                "prompt": "hello",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "mistral",
                "response": "Hi there!",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server);
        assert_eq!(client.chat("hello").await.unwrap(), "Hi there!");
    }

    #[tokio::test]
    async fn test_chat_missing_response_uses_fallback() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "done": true })))
            .mount(&server)
            .await;

        let client = make_client(&server);
        assert_eq!(client.chat("hello").await.unwrap(), FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_chat_error_body_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({ "error": "model 'mistral' not found" })),
            )
            .mount(&server)
            .await;

        let client = make_client(&server);
        let err = client.chat("hello").await.unwrap_err();
        match err {
            Error::UpstreamReported { status, detail } => {
                assert_eq!(status, 404);
                assert_eq!(detail, "model 'mistral' not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
