//! Language model completion client
//!
//! Speaks the OpenAI-compatible chat completions protocol (Groq by default).
//! Each call is a single round-trip with no retries.

use std::time::Duration;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::config::AiConfig;
use crate::models::ChatTurn;
use crate::utils::errors::{Result, UpstreamError, UpstreamResult};
use crate::utils::helpers::truncate_text;
use crate::utils::logging::log_api_error;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete `message` given a system instruction and prior turns
    async fn complete(&self, system: &str, history: &[ChatTurn], message: &str) -> UpstreamResult<String>;
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions client for Groq and compatible providers
#[derive(Debug, Clone)]
pub struct GroqClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GroqClient {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("CampusFlow/1.0")
            .build()?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            endpoint: format!("{}/chat/completions", config.api_url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, system: &str, history: &[ChatTurn], message: &str) -> UpstreamResult<String> {
        let api_key = self.api_key.as_deref().ok_or(UpstreamError::MissingApiKey)?;

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(CompletionMessage { role: "system", content: system });
        messages.extend(history.iter().map(|turn| CompletionMessage {
            role: turn.role.as_str(),
            content: &turn.text,
        }));
        messages.push(CompletionMessage { role: "user", content: message });

        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(model = %self.model, turns = history.len(), "Requesting completion");

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout
                } else {
                    UpstreamError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = truncate_text(&response.text().await.unwrap_or_default(), 200);
            log_api_error("completions", status.as_str(), Some(&body));
            return Err(match status.as_u16() {
                401 | 403 => UpstreamError::Unauthorized,
                429 => UpstreamError::RateLimited,
                code => UpstreamError::Api { status: code, message: body },
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| UpstreamError::InvalidResponse("empty completion".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use crate::config::Settings;

    fn client(server: &MockServer, api_key: Option<&str>) -> GroqClient {
        let config = AiConfig {
            api_key: api_key.map(str::to_string),
            api_url: format!("{}/openai/v1", server.uri()),
            ..Settings::default().ai
        };
        GroqClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_sends_history_and_returns_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "llama-3.3-70b-versatile",
                "max_tokens": 150,
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "hello"},
                    {"role": "user", "content": "what's on?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Hack Night is on Friday."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let history = vec![ChatTurn::user("hi"), ChatTurn::assistant("hello")];
        let reply = client(&server, Some("test-key"))
            .complete("be brief", &history, "what's on?")
            .await
            .unwrap();

        assert_eq!(reply, "Hack Night is on Friday.");
    }

    #[tokio::test]
    async fn test_missing_key_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let result = client(&server, None).complete("sys", &[], "hi").await;
        assert_matches!(result, Err(UpstreamError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_maps_provider_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let result = client(&server, Some("test-key")).complete("sys", &[], "hi").await;
        assert_matches!(result, Err(UpstreamError::RateLimited));
    }

    #[tokio::test]
    async fn test_empty_completion_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let result = client(&server, Some("test-key")).complete("sys", &[], "hi").await;
        assert_matches!(result, Err(UpstreamError::InvalidResponse(_)));
    }
}
