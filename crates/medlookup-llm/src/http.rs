//! OpenAI-compatible chat completions client.
//!
//! Works against any provider exposing `/v1/chat/completions` (OpenAI,
//! Mistral, Groq, local gateways).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{CompletionRequest, LlmClient, LlmError, LlmResult};
use crate::retry::RetryPolicy;

const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";
const DEFAULT_MODEL: &str = "mistral-large-latest";

/// Connection settings for [`ChatCompletionsClient`].
#[derive(Debug, Clone)]
pub struct ChatCompletionsConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ChatCompletionsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(20),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for chat completions with retry on transient failures.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    auth_header: String,
    url: String,
    model: String,
    retry: RetryPolicy,
}

impl ChatCompletionsClient {
    pub fn new(config: ChatCompletionsConfig) -> LlmResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Fatal(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = config.base_url.trim_end_matches('/');
        Ok(Self {
            client,
            auth_header: format!("Bearer {}", config.api_key),
            url: format!("{}/v1/chat/completions", base_url),
            model: config.model,
            retry: config.retry,
        })
    }

    fn build_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.prompt.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt.user,
        });

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.options.temperature,
            "top_p": request.options.top_p,
            "max_tokens": request.options.max_tokens,
        });

        if request.json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        body
    }

    async fn send_once(&self, body: &serde_json::Value) -> LlmResult<String> {
        let response = self
            .client
            .post(&self.url)
            .header("Authorization", &self.auth_header)
            .json(body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &error_body));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".into()))
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String> {
        let body = self.build_body(request);
        debug!(model = %self.model, json_mode = request.json_mode, "Sending chat completion");
        self.retry.run(|| self.send_once(&body)).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> LlmError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        LlmError::Transient(format!("Request failed: {}", err))
    } else {
        LlmError::Fatal(format!("Request failed: {}", err))
    }
}

fn classify_status(status: StatusCode, body: &str) -> LlmError {
    let message = format!("HTTP {}: {}", status, body);
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        LlmError::Transient(message)
    } else {
        LlmError::Fatal(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{CompletionOptions, Prompt};

    fn client() -> ChatCompletionsClient {
        ChatCompletionsClient::new(ChatCompletionsConfig {
            base_url: "http://localhost:9999/".into(),
            api_key: "test-key".into(),
            model: "test-model".into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_url_and_auth() {
        let client = client();
        assert_eq!(client.url, "http://localhost:9999/v1/chat/completions");
        assert_eq!(client.auth_header, "Bearer test-key");
        assert_eq!(client.model_name(), "test-model");
    }

    #[test]
    fn test_build_body_text() {
        let request = CompletionRequest::text(
            Prompt::new("What is Dolo 650?").with_system("be factual"),
            CompletionOptions::new(0.2, 600),
        );
        let body = client().build_body(&request);

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "What is Dolo 650?");
        assert_eq!(body["max_tokens"], 600);
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_build_body_json_mode() {
        let request =
            CompletionRequest::json(Prompt::new("extract"), CompletionOptions::new(0.0, 300));
        let body = client().build_body(&request);

        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "").is_retryable());
        assert!(classify_status(StatusCode::BAD_GATEWAY, "").is_retryable());
        assert!(!classify_status(StatusCode::UNAUTHORIZED, "bad key").is_retryable());
        assert!(!classify_status(StatusCode::BAD_REQUEST, "").is_retryable());
    }
}
