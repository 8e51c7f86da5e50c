//! Groq chat-completions client (OpenAI-compatible wire format).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{GenerationRequest, LanguageModel};
use crate::config::GroqConfig;
use crate::error::AiError;

const SERVICE: &str = "groq";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Secondary model client, used for supplementary commentary.
pub struct GroqClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl GroqClient {
    pub fn new(http: Client, config: &GroqConfig, api_key: &str) -> Self {
        Self {
            http,
            endpoint: format!(
                "{}/openai/v1/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl LanguageModel for GroqClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn generate(&self, prompt: &str, request: &GenerationRequest) -> Result<String, AiError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: request.temperature.unwrap_or(self.temperature),
            max_tokens: self.max_tokens,
        };

        debug!("POST {}", self.endpoint);
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::from_reqwest(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(AiError::Status {
                service: SERVICE,
                status: response.status().as_u16(),
            });
        }

        let reply: ChatResponse = response.json().await.map_err(|e| AiError::InvalidJson {
            service: SERVICE,
            reason: e.to_string(),
        })?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(AiError::EmptyReply { service: SERVICE })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> GroqClient {
        let config = GroqConfig {
            base_url: server.base_url(),
            timeout_secs: 2,
            ..GroqConfig::default()
        };
        GroqClient::new(Client::new(), &config, "gsk_test")
    }

    #[tokio::test]
    async fn test_generate_uses_bearer_and_chat_shape() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/openai/v1/chat/completions")
                    .header("authorization", "Bearer gsk_test")
                    .json_body_partial(
                        r#"{"model": "mixtral-8x7b-32768", "max_tokens": 1000, "messages": [{"role": "user", "content": "insights please"}]}"#,
                    );
                then.status(200).json_body(json!({
                    "choices": [{"index": 0, "message": {"role": "assistant", "content": "Undercut on lap 18."}}]
                }));
            })
            .await;

        let reply = client_for(&server)
            .generate("insights please", &GenerationRequest::text())
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(reply, "Undercut on lap 18.");
    }

    #[tokio::test]
    async fn test_generate_non_200() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(500);
            })
            .await;

        let err = client_for(&server)
            .generate("insights please", &GenerationRequest::text())
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
