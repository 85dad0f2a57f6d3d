//! Cache-aside answering of medicine questions.
//!
//! Relevance check → cache → intent extraction → resolution → synthesis →
//! cache write. Only answers that came out of a successful resolution are
//! cached; guidance replies are rebuilt every time.

mod relevance;

pub use relevance::*;

use std::sync::Arc;
use std::time::Duration;

use medlookup_llm::LlmClient;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{cache_key, Cache, CacheExt, DEFAULT_KEY_PREFIX};
use crate::models::{MedicineResponse, Outcome, QueryIntent, Resolution};
use crate::resolver::{
    normalize_medicine_name, IntentExtractor, MedicineResolver, ResolverConfig, ResolverError,
};
use crate::store::MedicineStore;
use crate::synthesizer::{
    disambiguation_reply, ResponseSynthesizer, SynthesisError, EXAMPLE_QUERIES, NAME_TIP,
    REJECTED_REPLY, UNIDENTIFIED_REPLY,
};

/// Assistant errors. Both variants are shown to the caller as a message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssistantError {
    /// A dependency failed in a way that may clear up on retry.
    #[error("Service temporarily unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ResolverError> for AssistantError {
    fn from(e: ResolverError) -> Self {
        if e.is_transient() {
            AssistantError::ServiceUnavailable(e.to_string())
        } else {
            AssistantError::Internal(e.to_string())
        }
    }
}

impl From<SynthesisError> for AssistantError {
    fn from(e: SynthesisError) -> Self {
        if e.is_transient() {
            AssistantError::ServiceUnavailable(e.to_string())
        } else {
            AssistantError::Internal(e.to_string())
        }
    }
}

pub type AssistantResult<T> = Result<T, AssistantError>;

/// Cache lifetimes and key namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantConfig {
    /// TTL for answers backed by the catalog
    pub db_ttl: Duration,
    /// TTL for unverified general-knowledge answers
    pub general_knowledge_ttl: Duration,
    pub key_prefix: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            db_ttl: Duration::from_secs(300),
            general_knowledge_ttl: Duration::from_secs(600),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

/// Answers free-text medicine questions.
pub struct MedicineAssistant {
    extractor: IntentExtractor,
    resolver: MedicineResolver,
    synthesizer: ResponseSynthesizer,
    cache: Arc<dyn Cache>,
    config: AssistantConfig,
}

impl MedicineAssistant {
    pub fn new(
        store: Arc<dyn MedicineStore>,
        llm: Arc<dyn LlmClient>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        Self {
            extractor: IntentExtractor::new(llm.clone()),
            resolver: MedicineResolver::new(store),
            synthesizer: ResponseSynthesizer::new(llm),
            cache,
            config: AssistantConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AssistantConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_resolver(mut self, resolver: MedicineResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_resolver_config(self, config: ResolverConfig) -> Self {
        let resolver = MedicineResolver::with_config(self.resolver.store(), config);
        self.with_resolver(resolver)
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Answer `message`, from cache when possible.
    pub async fn handle(&self, message: &str) -> AssistantResult<MedicineResponse> {
        if !is_plausible_medicine_query(message) {
            info!(outcome = "rejected", "Message is not a medicine query");
            return Ok(self.guidance(false, REJECTED_REPLY, Outcome::Rejected, None));
        }

        let key = cache_key(message, &self.config.key_prefix);
        if let Some(cached) = self.cached(&key).await {
            info!(outcome = ?cached.outcome(), cache = "hit", "Answered from cache");
            return Ok(cached);
        }

        let response = self.answer(message).await?;
        if let Some(ttl) = self.ttl_for(response.outcome()) {
            self.remember(&key, &response, ttl).await;
        }

        info!(outcome = ?response.outcome(), cache = "miss", "Answered");
        Ok(response)
    }

    /// The uncached path.
    async fn answer(&self, message: &str) -> AssistantResult<MedicineResponse> {
        let intent = self.extractor.extract(message).await;
        debug!(
            medicine = ?intent.medicine_name,
            query_type = %intent.query_type,
            source = ?intent.source,
            confidence = intent.confidence,
            "Extracted intent"
        );

        let name = match intent.medicine_name.clone() {
            Some(name) if intent.has_medicine() && !normalize_medicine_name(&name).is_empty() => {
                name
            }
            _ => {
                return Ok(self.guidance(
                    false,
                    UNIDENTIFIED_REPLY,
                    Outcome::Unidentified,
                    Some(intent),
                ))
            }
        };

        let model = self.synthesizer.model_name().to_string();
        let response = match self.resolver.resolve(&intent).await? {
            Resolution::Resolved { mut matches, strategy } if !matches.is_empty() => {
                debug!(strategy = ?strategy, count = matches.len(), "Resolved");
                matches.truncate(self.resolver.config().match_limit.max(1));
                let alternatives = self.resolver.find_alternatives(&matches[0]).await?;
                let reply = self
                    .synthesizer
                    .synthesize(&intent, &matches[0], &alternatives, message)
                    .await?;

                let mut response = MedicineResponse::new(true, reply, &model, Outcome::Answered);
                response.verified = Some(true);
                response.matches = matches;
                response.alternatives = alternatives;
                response
            }
            Resolution::Suggestions(suggestions) => {
                let reply = disambiguation_reply(&name, &suggestions);
                MedicineResponse::new(true, reply, &model, Outcome::Suggestions)
                    .with_suggestions(suggestions)
            }
            Resolution::Resolved { .. } | Resolution::Empty => {
                let reply = self.synthesizer.general_knowledge(&name, message).await?;
                let mut response =
                    MedicineResponse::new(true, reply, &model, Outcome::GeneralKnowledge);
                response.verified = Some(false);
                response
            }
        };

        Ok(MedicineResponse {
            query: Some(intent),
            ..response
        })
    }

    fn guidance(
        &self,
        success: bool,
        reply: &str,
        outcome: Outcome,
        intent: Option<QueryIntent>,
    ) -> MedicineResponse {
        let mut response =
            MedicineResponse::new(success, reply, self.synthesizer.model_name(), outcome);
        response.examples = EXAMPLE_QUERIES.iter().map(|e| e.to_string()).collect();
        if outcome == Outcome::Unidentified {
            response.tip = Some(NAME_TIP.to_string());
        }
        response.query = intent;
        response
    }

    fn ttl_for(&self, outcome: Outcome) -> Option<Duration> {
        if !outcome.is_cacheable() {
            return None;
        }
        match outcome {
            Outcome::GeneralKnowledge => Some(self.config.general_knowledge_ttl),
            _ => Some(self.config.db_ttl),
        }
    }

    async fn cached(&self, key: &str) -> Option<MedicineResponse> {
        match self.cache.get::<MedicineResponse>(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    async fn remember(&self, key: &str, response: &MedicineResponse, ttl: Duration) {
        if let Err(e) = self.cache.set(key, response, ttl).await {
            warn!(error = %e, "Cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::models::MedicineRecord;
    use crate::store::SqliteMedicineStore;
    use medlookup_llm::{LlmError, ScriptedLlmClient};

    async fn catalog() -> Arc<SqliteMedicineStore> {
        let store = SqliteMedicineStore::open_in_memory().unwrap();
        let mut dolo = MedicineRecord::new(1, "Dolo 650");
        dolo.manufacturer_name = Some("Micro Labs".into());
        dolo.short_composition1 = Some("Paracetamol (650mg)".into());
        dolo.price = Some(30.0);
        store.replace_catalog(vec![dolo]).await.unwrap();
        Arc::new(store)
    }

    #[test]
    fn test_error_mapping() {
        let transient: AssistantError =
            SynthesisError::Llm(LlmError::Transient("503".into())).into();
        assert!(matches!(transient, AssistantError::ServiceUnavailable(_)));

        let fatal: AssistantError = SynthesisError::Llm(LlmError::Fatal("401".into())).into();
        assert!(matches!(fatal, AssistantError::Internal(_)));
    }

    #[tokio::test]
    async fn test_rejected_makes_no_calls() {
        let llm = Arc::new(ScriptedLlmClient::new());
        let cache = Arc::new(InMemoryCache::default());
        let assistant = MedicineAssistant::new(catalog().await, llm.clone(), cache.clone());

        let response = assistant.handle("hello").await.unwrap();
        assert!(!response.success);
        assert_eq!(response.outcome(), Outcome::Rejected);
        assert_eq!(response.examples.len(), EXAMPLE_QUERIES.len());
        assert_eq!(llm.call_count(), 0);

        let key = cache_key("hello", DEFAULT_KEY_PREFIX);
        assert!(cache.get_raw(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unidentified_is_not_cached() {
        // Nothing the rules can pick up, and the model finds no name either.
        let llm = Arc::new(ScriptedLlmClient::new().with_reply(r#"{"medicine_name": null}"#));
        let cache = Arc::new(InMemoryCache::default());
        let assistant = MedicineAssistant::new(catalog().await, llm.clone(), cache.clone());

        let message = "what is the cost of it";
        let response = assistant.handle(message).await.unwrap();
        assert!(!response.success);
        assert_eq!(response.outcome(), Outcome::Unidentified);
        assert_eq!(response.tip.as_deref(), Some(NAME_TIP));

        let key = cache_key(message, DEFAULT_KEY_PREFIX);
        assert!(cache.get_raw(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_filler_name_gets_guidance() {
        let llm = Arc::new(ScriptedLlmClient::new().with_reply(r#"{"medicine_name": null}"#));
        let cache = Arc::new(InMemoryCache::default());
        let assistant = MedicineAssistant::new(catalog().await, llm.clone(), cache.clone());

        let message = "tell me the price";
        let response = assistant.handle(message).await.unwrap();
        assert!(!response.success);
        assert_eq!(response.outcome(), Outcome::Unidentified);
        assert_eq!(response.verified, None);
        assert_eq!(llm.call_count(), 1, "only the extraction fallback");

        let key = cache_key(message, DEFAULT_KEY_PREFIX);
        assert!(cache.get_raw(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_answer_is_cached_with_db_ttl() {
        let llm = Arc::new(ScriptedLlmClient::new().with_reply("Dolo 650 costs 30."));
        let cache = Arc::new(InMemoryCache::default());
        let assistant = MedicineAssistant::new(catalog().await, llm.clone(), cache.clone());

        let response = assistant.handle("What is the price of Dolo 650?").await.unwrap();
        assert!(response.success);
        assert_eq!(response.outcome(), Outcome::Answered);
        assert_eq!(response.verified, Some(true));
        assert_eq!(response.matches[0].name, "Dolo 650");

        let key = cache_key("what is the price of dolo 650?", DEFAULT_KEY_PREFIX);
        assert!(cache.get_raw(&key).await.unwrap().is_some());
        assert_eq!(assistant.ttl_for(Outcome::Answered), Some(Duration::from_secs(300)));
        assert_eq!(
            assistant.ttl_for(Outcome::GeneralKnowledge),
            Some(Duration::from_secs(600))
        );
        assert_eq!(assistant.ttl_for(Outcome::Suggestions), Some(Duration::from_secs(300)));
        assert_eq!(assistant.ttl_for(Outcome::Rejected), None);
    }

    #[tokio::test]
    async fn test_transient_synthesis_failure_is_unavailable() {
        let llm =
            Arc::new(ScriptedLlmClient::new().with_error(LlmError::Transient("timeout".into())));
        let cache = Arc::new(InMemoryCache::default());
        let assistant = MedicineAssistant::new(catalog().await, llm, cache.clone());

        let err = assistant.handle("What is the price of Dolo 650?").await.unwrap_err();
        assert!(matches!(err, AssistantError::ServiceUnavailable(_)));

        let key = cache_key("What is the price of Dolo 650?", DEFAULT_KEY_PREFIX);
        assert!(cache.get_raw(&key).await.unwrap().is_none());
    }
}
