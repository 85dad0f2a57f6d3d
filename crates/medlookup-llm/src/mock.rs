//! Scripted LLM client for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{CompletionRequest, LlmClient, LlmError, LlmResult};

/// Replays queued replies in order; the last one repeats once the queue
/// drains. Every request is recorded.
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<LlmResult<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.push(Ok(reply.into()));
        self
    }

    pub fn with_error(self, error: LlmError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, reply: LlmResult<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let mut replies = self
            .replies
            .lock()
            .map_err(|_| LlmError::Fatal("scripted client poisoned".into()))?;
        match replies.len() {
            0 => Err(LlmError::Fatal("no scripted reply".into())),
            1 => replies
                .front()
                .cloned()
                .unwrap_or_else(|| Err(LlmError::Fatal("no scripted reply".into()))),
            _ => replies
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Fatal("no scripted reply".into()))),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
