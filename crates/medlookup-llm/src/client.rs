//! LLM client trait and request types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extraction::parse_json_object;

/// LLM call errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network trouble, rate limiting or a 5xx from the provider.
    #[error("Transient LLM error: {0}")]
    Transient(String),

    /// Bad credentials, bad request or any other non-retryable failure.
    #[error("Fatal LLM error: {0}")]
    Fatal(String),

    /// The provider answered but the body was not what we expected.
    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Transient(_))
    }
}

pub type LlmResult<T> = Result<T, LlmError>;

/// A system + user prompt pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
}

impl Prompt {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Sampling options for a completion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 600,
            top_p: 1.0,
        }
    }
}

impl CompletionOptions {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
            ..Default::default()
        }
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }
}

/// A single completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: Prompt,
    pub options: CompletionOptions,
    /// Ask the provider for a JSON object instead of free text.
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn text(prompt: Prompt, options: CompletionOptions) -> Self {
        Self {
            prompt,
            options,
            json_mode: false,
        }
    }

    pub fn json(prompt: Prompt, options: CompletionOptions) -> Self {
        Self {
            prompt,
            options,
            json_mode: true,
        }
    }
}

/// Text generation backend.
#[async_trait]
pub trait LlmClient: Send + Sync + std::fmt::Debug {
    /// Run a completion and return the model's text.
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String>;

    /// Model identifier reported in response metadata.
    fn model_name(&self) -> &str;

    /// Run a JSON-mode completion.
    ///
    /// Returns `Ok(None)` when the output cannot be read as a JSON object;
    /// callers treat that as "extraction failed".
    async fn complete_json(
        &self,
        prompt: Prompt,
        options: CompletionOptions,
    ) -> LlmResult<Option<serde_json::Value>> {
        let raw = self.complete(&CompletionRequest::json(prompt, options)).await?;
        Ok(parse_json_object(&raw).ok())
    }
}
