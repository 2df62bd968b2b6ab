use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{config::OpenAiConfig, error::ExtractionError, model::UsageMetrics};

use super::{ChatCompletion, ChatReply};

/// OpenAI-compatible chat-completion client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    api_key: String,
    model: String,
    endpoint: String,
    max_tokens: u32,
    http: Client,
}

impl OpenAiClient {
    pub fn new(api_key: String, config: &OpenAiConfig) -> Result<Self, ExtractionError> {
        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            max_tokens: config.max_tokens,
            http,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsageMetrics>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<ChatReply, ExtractionError> {
        let payload = ChatRequest {
            model: &self.model,
            messages: [
                Message { role: "system", content: system },
                Message { role: "user", content: user },
            ],
            temperature: 0.0,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat { kind: "json_object" },
        };

        debug!(model = %self.model, prompt_chars = user.len(), "calling chat completion");

        let res = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| truncate_body(&body));
            error!(status = status.as_u16(), %message, "chat completion failed");
            return Err(ExtractionError::Backend { status: status.as_u16(), message });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(ExtractionError::Malformed)?;

        if let Some(err) = parsed.error {
            return Err(ExtractionError::Backend { status: status.as_u16(), message: err.message });
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ExtractionError::EmptyReply)?;

        Ok(ChatReply { content, usage: parsed.usage })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiClient {
        let config = OpenAiConfig { base_url: server.uri(), ..OpenAiConfig::default() };
        OpenAiClient::new("test-key".to_string(), &config).unwrap()
    }

    #[tokio::test]
    async fn sends_deterministic_json_request_and_reads_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "temperature": 0.0,
                "max_tokens": 2000,
                "response_format": { "type": "json_object" },
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "hello" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "{\"location\":\"Paris\"}" } }],
                "usage": {
                    "prompt_tokens": 120,
                    "completion_tokens": 30,
                    "total_tokens": 150,
                    "prompt_tokens_details": { "cached_tokens": 0, "audio_tokens": 0 },
                    "completion_tokens_details": { "reasoning_tokens": 0 }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server).complete("sys", "hello").await.expect("reply");

        assert_eq!(reply.content, "{\"location\":\"Paris\"}");
        let usage = reply.usage.expect("usage reported");
        assert_eq!(usage.prompt_tokens, 120);
        assert_eq!(usage.completion_tokens, 30);
        assert_eq!(usage.total_tokens, 150);
        assert_eq!(usage.prompt_tokens_details.cached_tokens, Some(0));
        assert_eq!(usage.completion_tokens_details.reasoning_tokens, Some(0));
        assert_eq!(usage.completion_tokens_details.audio_tokens, None);
    }

    #[tokio::test]
    async fn missing_usage_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "{}" } }]
            })))
            .mount(&server)
            .await;

        let reply = client_for(&server).complete("sys", "hello").await.unwrap();
        assert!(reply.usage.is_none());
    }

    #[tokio::test]
    async fn backend_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Incorrect API key provided" }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).complete("sys", "hello").await.unwrap_err();
        match err {
            ExtractionError::Backend { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("Incorrect API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn reply_without_choices_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server).complete("sys", "hello").await.unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyReply));
    }

    #[tokio::test]
    async fn error_envelope_with_ok_status_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": { "message": "The model `gpt-x` does not exist" }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).complete("sys", "hello").await.unwrap_err();
        match err {
            ExtractionError::Backend { status, message } => {
                assert_eq!(status, 200);
                assert!(message.contains("does not exist"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).complete("sys", "hello").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed(_)));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "choices": [{ "message": { "content": "{}" } }] }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = OpenAiConfig { base_url: server.uri(), timeout_secs: 1, ..OpenAiConfig::default() };
        let client = OpenAiClient::new("test-key".to_string(), &config).unwrap();
        let err = client.complete("sys", "hello").await.unwrap_err();

        assert!(matches!(err, ExtractionError::Timeout));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "°".repeat(300);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
