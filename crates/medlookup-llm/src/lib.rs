//! LLM seam for medicine queries.
//!
//! This crate owns everything that talks to (or about) the language model:
//! the [`LlmClient`] trait, an OpenAI-compatible chat-completions client with
//! bounded retry, the prompt texts, and strict parsing of the JSON the model
//! returns for intent extraction.

pub mod client;
pub mod extraction;
pub mod http;
pub mod mock;
pub mod prompts;
pub mod retry;

pub use client::*;
pub use extraction::*;
pub use http::{ChatCompletionsClient, ChatCompletionsConfig};
pub use mock::ScriptedLlmClient;
pub use prompts::*;
pub use retry::RetryPolicy;
