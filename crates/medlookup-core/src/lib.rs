//! Medlookup Core Library
//!
//! Answers free-text medicine questions against a local catalog.
//!
//! # Architecture
//!
//! ```text
//! message → relevance check ──(reject)──▶ guidance
//!              │
//!              ▼
//!          cache lookup ──(hit)──▶ cached response
//!              │
//!              ▼
//!       intent extraction (rules, then LLM)
//!              │
//!              ▼
//!   exact → prefix → substring → fuzzy       [MedicineStore]
//!              │
//!     ┌────────┼──────────────┐
//!     ▼        ▼              ▼
//!  answer   suggestions   general knowledge
//!     │        │              │
//!     └────────┴──────┬───────┘
//!                     ▼
//!                cache write
//! ```
//!
//! # Core Principle
//!
//! **Catalog facts come from the catalog.** The LLM phrases answers from
//! stored fields; anything it says without a catalog record is flagged as
//! unverified.
//!
//! # Modules
//!
//! - [`db`]: SQLite catalog with a `regexp` function for pattern lookups
//! - [`store`]: async store seam over the database
//! - [`models`]: Domain types (MedicineRecord, QueryIntent, MedicineResponse, etc.)
//! - [`resolver`]: intent extraction, normalization and layered lookup
//! - [`synthesizer`]: answer text via the LLM
//! - [`cache`]: response cache (moka or Redis)
//! - [`assistant`]: the cache-aside controller
//! - [`import`]: catalog import from JSON exports

pub mod assistant;
pub mod cache;
pub mod config;
pub mod db;
pub mod import;
pub mod models;
pub mod resolver;
pub mod store;
pub mod synthesizer;

// Re-export commonly used types
pub use assistant::{AssistantConfig, AssistantError, MedicineAssistant};
pub use cache::{Cache, CacheExt, InMemoryCache, RedisCache};
pub use config::{CacheBackend, CacheConfig, DatabaseConfig, LlmConfig};
pub use db::Database;
pub use models::{
    IntentSource, MatchStrategy, MedicineRecord, MedicineResponse, Outcome, QueryIntent,
    QueryType, Resolution, Suggestion,
};
pub use resolver::{IntentExtractor, MedicineResolver, ResolverConfig};
pub use store::{MedicineQuery, MedicineStore, SqliteMedicineStore};
pub use synthesizer::ResponseSynthesizer;
