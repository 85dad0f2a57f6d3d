//! Component configuration.
//!
//! Plain serde structs with defaults; the server layers files and
//! environment variables on top of them.

use std::path::PathBuf;
use std::time::Duration;

use medlookup_llm::{ChatCompletionsConfig, RetryPolicy};
use serde::{Deserialize, Serialize};

use crate::assistant::AssistantConfig;
use crate::cache::DEFAULT_KEY_PREFIX;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file holding the catalog
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/medicines.db"),
        }
    }
}

/// Supported cache backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Required for the redis backend
    pub redis_url: Option<String>,
    pub key_prefix: String,
    /// Entry bound for the memory backend
    pub max_capacity: u64,
    pub db_ttl_secs: u64,
    pub general_knowledge_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            max_capacity: 10_000,
            db_ttl_secs: 300,
            general_knowledge_ttl_secs: 600,
        }
    }
}

impl CacheConfig {
    pub fn with_backend(mut self, backend: CacheBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    pub fn with_ttls(mut self, db_ttl_secs: u64, general_knowledge_ttl_secs: u64) -> Self {
        self.db_ttl_secs = db_ttl_secs;
        self.general_knowledge_ttl_secs = general_knowledge_ttl_secs;
        self
    }

    pub fn assistant_config(&self) -> AssistantConfig {
        AssistantConfig {
            db_ttl: Duration::from_secs(self.db_ttl_secs),
            general_knowledge_ttl: Duration::from_secs(self.general_knowledge_ttl_secs),
            key_prefix: self.key_prefix.clone(),
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

// Keeps the API key out of logs.
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("base_delay_ms", &self.base_delay_ms)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        let defaults = ChatCompletionsConfig::default();
        Self {
            base_url: defaults.base_url,
            api_key: defaults.api_key,
            model: defaults.model,
            timeout_secs: defaults.timeout.as_secs(),
            max_attempts: defaults.retry.max_attempts,
            base_delay_ms: defaults.retry.base_delay.as_millis() as u64,
        }
    }
}

impl LlmConfig {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn chat_config(&self) -> ChatCompletionsConfig {
        ChatCompletionsConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            retry: RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms)),
        }
    }
}
