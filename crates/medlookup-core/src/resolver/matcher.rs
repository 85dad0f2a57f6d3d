//! Layered catalog lookup.
//!
//! Layers, stopping at the first that returns anything:
//! 1. exact name (case-insensitive)
//! 2. name prefix
//! 3. name substring
//! 4. fuzzy: bounded prefix candidates scored by edit distance
//!
//! Layers 1-3 honour the intent's manufacturer and dosage-form hints; layer 4
//! only ever produces suggestions, never a resolved match.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::alternatives::find_alternatives;
use super::normalizer::{escape_for_pattern_match, normalize_medicine_name};
use super::similarity::name_similarity;
use super::ResolverResult;
use crate::models::{MatchStrategy, MedicineRecord, QueryIntent, Resolution, Suggestion};
use crate::store::{Condition, Field, MedicineQuery, MedicineStore};

/// Resolver switches and bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub exact: bool,
    pub prefix: bool,
    pub substring: bool,
    pub fuzzy: bool,
    /// Minimum similarity (0 - 100) for a fuzzy suggestion
    pub similarity_threshold: f64,
    /// Most candidates scored per fuzzy lookup
    pub fuzzy_candidate_limit: usize,
    /// Name prefix lengths tried for fuzzy candidates, in order
    pub fuzzy_prefix_lengths: Vec<usize>,
    pub max_suggestions: usize,
    pub substring_limit: usize,
    /// Most records returned by the exact and prefix layers
    pub match_limit: usize,
    pub alternatives_limit: usize,
    /// Retry layers 1-3 without hints when the hints leave nothing
    pub relax_filters: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            exact: true,
            prefix: true,
            substring: true,
            fuzzy: true,
            similarity_threshold: 70.0,
            fuzzy_candidate_limit: 50,
            fuzzy_prefix_lengths: vec![4, 3, 2, 1],
            max_suggestions: 5,
            substring_limit: 10,
            match_limit: 5,
            alternatives_limit: 5,
            relax_filters: true,
        }
    }
}

/// Resolves intents against a [`MedicineStore`].
#[derive(Clone)]
pub struct MedicineResolver {
    store: Arc<dyn MedicineStore>,
    config: ResolverConfig,
}

impl MedicineResolver {
    pub fn new(store: Arc<dyn MedicineStore>) -> Self {
        Self::with_config(store, ResolverConfig::default())
    }

    pub fn with_config(store: Arc<dyn MedicineStore>, config: ResolverConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn MedicineStore> {
        self.store.clone()
    }

    /// Resolve the intent's medicine name.
    pub async fn resolve(&self, intent: &QueryIntent) -> ResolverResult<Resolution> {
        let raw = match intent.medicine_name.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(Resolution::Empty),
        };

        let term = search_term(raw);
        if term.is_empty() {
            return Ok(Resolution::Empty);
        }

        let hints = hint_conditions(intent);
        if let Some(resolution) = self.match_layers(&term, &hints).await? {
            return Ok(resolution);
        }

        if !hints.is_empty() && self.config.relax_filters {
            debug!(term = %term, "Hints eliminated all matches, retrying without them");
            if let Some(resolution) = self.match_layers(&term, &[]).await? {
                return Ok(resolution);
            }
        }

        if self.config.fuzzy {
            let suggestions = self.fuzzy_suggestions(&term).await?;
            if !suggestions.is_empty() {
                debug!(term = %term, count = suggestions.len(), "Fuzzy suggestions");
                return Ok(Resolution::Suggestions(suggestions));
            }
        }

        debug!(term = %term, "No catalog match");
        Ok(Resolution::Empty)
    }

    /// Cheaper same-composition medicines from other manufacturers.
    pub async fn find_alternatives(
        &self,
        primary: &MedicineRecord,
    ) -> ResolverResult<Vec<MedicineRecord>> {
        Ok(find_alternatives(self.store.as_ref(), primary, self.config.alternatives_limit).await?)
    }

    /// Layers 1-3 with the given extra conditions.
    async fn match_layers(
        &self,
        term: &str,
        hints: &[Condition],
    ) -> ResolverResult<Option<Resolution>> {
        let variants = spacing_variants(term);

        if self.config.exact {
            let query = with_hints(MedicineQuery::new(), hints)
                .and(Condition::matches(
                    Field::Name,
                    format!("^{}$", escape_for_pattern_match(term)),
                ))
                .limit(self.config.match_limit);
            if let Some(resolution) = self.run_layer(&query, MatchStrategy::Exact).await? {
                return Ok(Some(resolution));
            }
        }

        if self.config.prefix {
            let mut query = with_hints(MedicineQuery::new(), hints).limit(self.config.match_limit);
            for variant in &variants {
                query = query.or(Condition::matches(
                    Field::Name,
                    format!("^{}", escape_for_pattern_match(variant)),
                ));
            }
            if let Some(resolution) = self.run_layer(&query, MatchStrategy::Prefix).await? {
                return Ok(Some(resolution));
            }
        }

        if self.config.substring {
            let mut query =
                with_hints(MedicineQuery::new(), hints).limit(self.config.substring_limit);
            for variant in &variants {
                query = query.or(Condition::matches(
                    Field::Name,
                    escape_for_pattern_match(variant),
                ));
            }
            if let Some(resolution) = self.run_layer(&query, MatchStrategy::Substring).await? {
                return Ok(Some(resolution));
            }
        }

        Ok(None)
    }

    async fn run_layer(
        &self,
        query: &MedicineQuery,
        strategy: MatchStrategy,
    ) -> ResolverResult<Option<Resolution>> {
        let matches = self.store.find(query).await?;
        if matches.is_empty() {
            return Ok(None);
        }
        debug!(?strategy, count = matches.len(), "Catalog layer matched");
        Ok(Some(Resolution::Resolved { matches, strategy }))
    }

    /// Score candidates sharing the longest usable name prefix with the term.
    async fn fuzzy_suggestions(&self, term: &str) -> ResolverResult<Vec<Suggestion>> {
        let compact: String = term.chars().filter(|c| !c.is_whitespace()).collect();
        let term_len = compact.chars().count();

        for &len in &self.config.fuzzy_prefix_lengths {
            if len == 0 || len > term_len {
                continue;
            }
            let prefix: String = compact.chars().take(len).collect();
            let query = MedicineQuery::new()
                .and(Condition::matches(
                    Field::Name,
                    format!("^{}", escape_for_pattern_match(&prefix)),
                ))
                .limit(self.config.fuzzy_candidate_limit);

            let candidates = self.store.find(&query).await?;
            if candidates.is_empty() {
                continue;
            }

            let mut scored: Vec<Suggestion> = candidates
                .iter()
                .map(|c| Suggestion::from_record(c, name_similarity(term, &c.name)))
                .filter(|s| s.score >= self.config.similarity_threshold)
                .collect();
            scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
            scored.truncate(self.config.max_suggestions);
            return Ok(scored);
        }

        Ok(Vec::new())
    }
}

/// Lowercased normalized name. Empty means no medicine was named.
pub fn search_term(raw: &str) -> String {
    normalize_medicine_name(raw).to_lowercase()
}

/// The term as given, plus without internal spaces when that differs.
fn spacing_variants(term: &str) -> Vec<String> {
    let compact: String = term.chars().filter(|c| !c.is_whitespace()).collect();
    if compact == term {
        vec![term.to_string()]
    } else {
        vec![term.to_string(), compact]
    }
}

fn hint_conditions(intent: &QueryIntent) -> Vec<Condition> {
    let mut hints = Vec::new();
    if let Some(manufacturer) = intent
        .manufacturer
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        hints.push(Condition::matches(
            Field::Manufacturer,
            escape_for_pattern_match(&manufacturer.to_lowercase()),
        ));
    }
    if let Some(form) = intent
        .dosage_form
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        hints.push(Condition::matches(
            Field::DosageForm,
            escape_for_pattern_match(&form.to_lowercase()),
        ));
    }
    hints
}

fn with_hints(mut query: MedicineQuery, hints: &[Condition]) -> MedicineQuery {
    query.conditions.extend(hints.iter().cloned());
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IntentSource, QueryType};
    use crate::store::SqliteMedicineStore;

    fn record(id: i64, name: &str, manufacturer: &str, form: &str) -> MedicineRecord {
        let mut r = MedicineRecord::new(id, name);
        r.manufacturer_name = Some(manufacturer.into());
        r.dosage_form = Some(form.into());
        r
    }

    async fn resolver_with(records: Vec<MedicineRecord>) -> MedicineResolver {
        let store = SqliteMedicineStore::open_in_memory().unwrap();
        store.replace_catalog(records).await.unwrap();
        MedicineResolver::new(Arc::new(store))
    }

    fn intent(name: &str) -> QueryIntent {
        QueryIntent::new(name, QueryType::FullDetails, 0.9, IntentSource::Pattern)
    }

    fn catalog() -> Vec<MedicineRecord> {
        vec![
            record(1, "Paracetamol 500", "Cipla Ltd", "tablet"),
            record(2, "Paracetamol 650", "Micro Labs", "tablet"),
            record(3, "Dolo 650", "Micro Labs", "tablet"),
            record(4, "Crocin Advance", "GSK", "tablet"),
            record(5, "Crocin Syrup", "GSK", "syrup"),
            record(6, "Metacin Paracetamol Combo", "Themis", "tablet"),
        ]
    }

    #[tokio::test]
    async fn test_exact_match() {
        let resolver = resolver_with(catalog()).await;
        let resolution = resolver.resolve(&intent("dolo 650")).await.unwrap();

        match resolution {
            Resolution::Resolved { matches, strategy } => {
                assert_eq!(strategy, MatchStrategy::Exact);
                assert_eq!(matches.len(), 1);
                assert_eq!(matches[0].id, 3);
            }
            other => panic!("expected exact match, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_prefix_match() {
        let resolver = resolver_with(catalog()).await;
        let resolution = resolver.resolve(&intent("paracetamol")).await.unwrap();

        match resolution {
            Resolution::Resolved { matches, strategy } => {
                assert_eq!(strategy, MatchStrategy::Prefix);
                assert_eq!(matches.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2]);
            }
            other => panic!("expected prefix match, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_prefix_without_spaces() {
        let resolver = resolver_with(vec![record(1, "CrocinAdvance", "GSK", "tablet")]).await;
        let resolution = resolver.resolve(&intent("crocin advance")).await.unwrap();
        assert_eq!(resolution.primary().map(|m| m.id), Some(1));
    }

    #[tokio::test]
    async fn test_substring_match() {
        let resolver = resolver_with(catalog()).await;
        let resolution = resolver.resolve(&intent("advance")).await.unwrap();

        match resolution {
            Resolution::Resolved { matches, strategy } => {
                assert_eq!(strategy, MatchStrategy::Substring);
                assert_eq!(matches[0].id, 4);
            }
            other => panic!("expected substring match, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fuzzy_suggestions_for_typo() {
        let resolver = resolver_with(catalog()).await;
        let resolution = resolver.resolve(&intent("paracetmol")).await.unwrap();

        match resolution {
            Resolution::Suggestions(suggestions) => {
                assert!(!suggestions.is_empty());
                assert!(suggestions.len() <= 5);
                assert!(suggestions.iter().all(|s| s.score >= 70.0));
                assert!(suggestions[0].name.starts_with("Paracetamol"));
            }
            other => panic!("expected suggestions, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_nothing_similar_is_empty() {
        let resolver = resolver_with(catalog()).await;
        let resolution = resolver.resolve(&intent("zzqxv")).await.unwrap();
        assert!(resolution.is_empty());
    }

    #[tokio::test]
    async fn test_hints_narrow_matches() {
        let resolver = resolver_with(catalog()).await;

        let mut query = intent("crocin");
        query.dosage_form = Some("syrup".into());
        let resolution = resolver.resolve(&query).await.unwrap();
        match resolution {
            Resolution::Resolved { matches, .. } => {
                assert_eq!(matches.iter().map(|m| m.id).collect::<Vec<_>>(), vec![5]);
            }
            other => panic!("expected match, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_hints_relaxed_when_they_eliminate_everything() {
        let resolver = resolver_with(catalog()).await;

        let mut query = intent("dolo 650");
        query.manufacturer = Some("Nonexistent Pharma".into());
        let resolution = resolver.resolve(&query).await.unwrap();
        assert_eq!(resolution.primary().map(|m| m.id), Some(3));
    }

    #[tokio::test]
    async fn test_hints_not_relaxed_when_disabled() {
        let store = SqliteMedicineStore::open_in_memory().unwrap();
        store.replace_catalog(catalog()).await.unwrap();
        let config = ResolverConfig {
            relax_filters: false,
            fuzzy: false,
            ..Default::default()
        };
        let resolver = MedicineResolver::with_config(Arc::new(store), config);

        let mut query = intent("dolo 650");
        query.manufacturer = Some("Nonexistent Pharma".into());
        assert!(resolver.resolve(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_medicine_name_is_empty() {
        let resolver = resolver_with(catalog()).await;
        assert!(resolver.resolve(&QueryIntent::fallback()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metacharacters_are_literal() {
        let resolver = resolver_with(vec![record(1, "Vitamin C+ Zinc", "Abbott", "tablet")]).await;
        let resolution = resolver.resolve(&intent("Vitamin C+")).await.unwrap();
        assert_eq!(resolution.primary().map(|m| m.id), Some(1));
    }

    #[test]
    fn test_search_term() {
        assert_eq!(search_term("What is the price of Paracetamol 500mg"), "paracetamol");
        assert_eq!(search_term("Dolo 650"), "dolo 650");
        assert_eq!(search_term("tell me the"), "");
    }

    #[tokio::test]
    async fn test_filler_name_is_empty() {
        let resolver = resolver_with(catalog()).await;
        let resolution = resolver.resolve(&intent("show me the")).await.unwrap();
        assert!(resolution.is_empty());
    }
}
