//! Medlookup server
//!
//! HTTP API over the medicine assistant, plus the catalog import command.

pub mod api;
pub mod cli;
pub mod config;
pub mod logging;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use medlookup_core::{cache, MedicineAssistant, MedicineResolver, SqliteMedicineStore};
use medlookup_llm::ChatCompletionsClient;
use tracing::{info, warn};

use api::state::AppState;
use config::AppConfig;

/// Open the catalog file, creating its directory if needed.
pub fn open_store(path: &Path) -> anyhow::Result<SqliteMedicineStore> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    SqliteMedicineStore::open(path)
        .with_context(|| format!("Failed to open catalog at {}", path.display()))
}

/// Wire the store, cache and LLM client from configuration.
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = Arc::new(open_store(&config.database.path)?);

    if config.llm.api_key.is_empty() {
        warn!("llm.api_key is empty; LLM calls will be rejected by the provider");
    }
    let llm = Arc::new(ChatCompletionsClient::new(config.llm.chat_config())?);

    let cache = cache::connect(&config.cache)
        .await
        .context("Failed to initialize cache")?;
    info!(backend = ?config.cache.backend, "Cache ready");

    let resolver = MedicineResolver::with_config(store.clone(), config.resolver.clone());
    let assistant = MedicineAssistant::new(store.clone(), llm, cache)
        .with_resolver(resolver)
        .with_config(config.cache.assistant_config());

    Ok(AppState::new(
        Arc::new(assistant),
        store,
        Duration::from_secs(config.server.request_timeout_secs),
    ))
}
