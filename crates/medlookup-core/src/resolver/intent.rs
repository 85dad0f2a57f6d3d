//! Query intent extraction.
//!
//! An ordered list of [`IntentRule`]s is tried first; the first rule that
//! captures a medicine name wins. Only when no rule fires is the LLM asked,
//! and its output is validated before use. Extraction never fails: the worst
//! case is [`QueryIntent::fallback`].

use std::fmt;
use std::sync::Arc;

use medlookup_llm::{
    make_intent_prompt, CompletionOptions, LlmClient, Prompt, RawIntent, INTENT_SYSTEM_PROMPT,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::normalizer::normalize_medicine_name;
use crate::models::{IntentSource, QueryIntent, QueryType};

/// Confidence of the phrasing rules.
pub const PATTERN_CONFIDENCE: f64 = 0.9;

/// Words that are never a medicine name on their own.
pub const STOPWORDS: &[&str] = &[
    "a", "about", "all", "alternative", "alternatives", "an", "and", "any", "are", "be", "best",
    "buy", "by", "can", "composition", "content", "cost", "costs", "details", "do", "does",
    "drug", "effect", "effects", "for", "from", "get", "give", "hello", "hi", "how", "i", "in",
    "info", "information", "ingredients", "is", "it", "list", "me", "medicine", "medicines",
    "much", "my", "need", "of", "on", "or", "please", "price", "rate", "should", "show", "side",
    "similar", "substitute", "substitutes", "take", "tell", "the", "this", "to", "use", "uses",
    "want", "what", "whats", "which", "with", "you",
];

/// Dosage-form keywords and their canonical names.
const DOSAGE_FORMS: &[(&str, &str)] = &[
    ("tablets", "tablet"),
    ("tablet", "tablet"),
    ("tabs", "tablet"),
    ("capsules", "capsule"),
    ("capsule", "capsule"),
    ("syrup", "syrup"),
    ("injection", "injection"),
    ("cream", "cream"),
    ("gel", "gel"),
    ("ointment", "ointment"),
    ("drops", "drops"),
    ("inhaler", "inhaler"),
    ("spray", "spray"),
    ("suspension", "suspension"),
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

static COMPOSITION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:content|composition|ingredients?|salts?)(?:\s+(?:of|in))?\s+([A-Za-z0-9][A-Za-z0-9+\- ]*)",
        r"(?i)^(?:what\s+is\s+)?(?:the\s+)?([A-Za-z0-9][A-Za-z0-9+\- ]*?)\s+(?:composition|ingredients|content)\b",
    ])
});

static PRICE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:price|cost|rate|mrp)\s+(?:of|for)\s+(.+)",
        r"(?i)\bhow\s+much\s+(?:is|for|does|do)?\s*(.+?)(?:\s+(?:cost|costs|price))?\s*[?.!]*$",
        r"(?i)^(?:what\s+is\s+)?(?:the\s+)?(.+?)\s+(?:price|cost|rate|mrp)\b",
    ])
});

static ALTERNATIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:alternatives?|substitutes?|similar(?:\s+medicines?)?|replacements?)\s+(?:to|for|of)\s+(.+)",
        r"(?i)^(?:show\s+(?:me\s+)?)?(?:the\s+)?(.+?)\s+(?:alternatives?|substitutes?)\b",
    ])
});

static SIDE_EFFECT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:side[\s-]?effects?|adverse\s+effects?|reactions?)\s+(?:of|for|from|with)\s+(.+)",
        r"(?i)^(?:what\s+are\s+)?(?:the\s+)?(.+?)\s+side[\s-]?effects?\b",
    ])
});

static MANUFACTURER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:by|from)\s+([A-Za-z][A-Za-z0-9&.\- ]*?)\s*(?:[,?!;]|\.\s|\.?$)").unwrap()
});

/// Everything up to the last "by"/"from" inside a manufacturer capture.
static EARLIER_CLAUSES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^.*\b(?:by|from)\s+").unwrap());

static MANUFACTURER_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(?:by|from)\s+.*$").unwrap());

static TRAILING_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:\s+(?:tablets?|tabs|capsules?|syrup|injection|cream|gel|ointment|drops|inhaler|spray|suspension)\b|[\s?.!,;:]+)+$",
    )
    .unwrap()
});

static LEADING_ARTICLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:the|a|an)\s+").unwrap());

static CAPITALIZED_WITH_DOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][A-Za-z0-9\-]+)(\s+\d+(?:\.\d+)?\s*(?:mg|mcg|ml|g|iu)?\b)?").unwrap()
});

static NAME_WITH_DOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([a-z][a-z\-]{2,})\s*\d+(?:\.\d+)?\s*(?:mg|mcg|ml|g|iu)?\b").unwrap()
});

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word.to_lowercase().as_str())
}

fn is_dosage_form(word: &str) -> bool {
    let lower = word.to_lowercase();
    DOSAGE_FORMS.iter().any(|(kw, _)| *kw == lower)
}

/// How a rule finds a medicine name in a message.
enum Matcher {
    /// Capture group 1 of the first matching pattern
    Patterns(Vec<Regex>),
    Custom(Box<dyn Fn(&str) -> Option<String> + Send + Sync>),
}

/// One step of the extraction cascade.
pub struct IntentRule {
    pub name: &'static str,
    pub query_type: QueryType,
    pub confidence: f64,
    pub source: IntentSource,
    matcher: Matcher,
}

impl fmt::Debug for IntentRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntentRule")
            .field("name", &self.name)
            .field("query_type", &self.query_type)
            .field("confidence", &self.confidence)
            .field("source", &self.source)
            .finish()
    }
}

impl IntentRule {
    /// Rule that takes capture group 1 of the first matching pattern.
    pub fn patterns(
        name: &'static str,
        query_type: QueryType,
        confidence: f64,
        patterns: Vec<Regex>,
    ) -> Self {
        Self {
            name,
            query_type,
            confidence,
            source: IntentSource::Pattern,
            matcher: Matcher::Patterns(patterns),
        }
    }

    /// Rule backed by an arbitrary function returning the medicine name.
    pub fn custom<F>(
        name: &'static str,
        query_type: QueryType,
        confidence: f64,
        source: IntentSource,
        matcher: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            name,
            query_type,
            confidence,
            source,
            matcher: Matcher::Custom(Box::new(matcher)),
        }
    }

    /// The cleaned medicine name this rule captures, if it fires.
    pub fn capture(&self, message: &str) -> Option<String> {
        match &self.matcher {
            Matcher::Patterns(patterns) => patterns.iter().find_map(|re| {
                re.captures(message)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| clean_capture(m.as_str()))
            }),
            Matcher::Custom(f) => f(message).and_then(|s| clean_capture(&s)),
        }
    }
}

/// The rule list used by [`IntentExtractor::new`].
pub fn default_rules() -> Vec<IntentRule> {
    vec![
        IntentRule::patterns(
            "composition",
            QueryType::Composition,
            PATTERN_CONFIDENCE,
            COMPOSITION_PATTERNS.clone(),
        ),
        IntentRule::patterns("price", QueryType::Price, PATTERN_CONFIDENCE, PRICE_PATTERNS.clone()),
        IntentRule::patterns(
            "alternatives",
            QueryType::Alternatives,
            PATTERN_CONFIDENCE,
            ALTERNATIVE_PATTERNS.clone(),
        ),
        IntentRule::patterns(
            "side_effects",
            QueryType::SideEffects,
            PATTERN_CONFIDENCE,
            SIDE_EFFECT_PATTERNS.clone(),
        ),
        IntentRule::custom(
            "capitalized_word",
            QueryType::FullDetails,
            0.85,
            IntentSource::Heuristic,
            capitalized_word,
        ),
        IntentRule::custom(
            "name_with_dose",
            QueryType::FullDetails,
            0.8,
            IntentSource::Heuristic,
            name_with_dose,
        ),
        IntentRule::custom(
            "single_word",
            QueryType::FullDetails,
            0.75,
            IntentSource::Heuristic,
            single_significant_word,
        ),
    ]
}

/// First capitalized non-stopword, with a directly following dose if any.
fn capitalized_word(message: &str) -> Option<String> {
    CAPITALIZED_WITH_DOSE.captures_iter(message).find_map(|caps| {
        let word = caps.get(1)?.as_str();
        if is_stopword(word) || is_dosage_form(word) {
            return None;
        }
        caps.get(0).map(|m| m.as_str().trim().to_string())
    })
}

/// First `word number [unit]` whose word is not a stopword.
fn name_with_dose(message: &str) -> Option<String> {
    NAME_WITH_DOSE.captures_iter(message).find_map(|caps| {
        let word = caps.get(1)?.as_str();
        if is_stopword(word) || is_dosage_form(word) {
            return None;
        }
        caps.get(0).map(|m| m.as_str().trim().to_string())
    })
}

/// The message's only significant word, if it has exactly one.
fn single_significant_word(message: &str) -> Option<String> {
    let mut significant = message
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| t.chars().count() >= 3 && t.chars().all(char::is_alphabetic))
        .filter(|t| !is_stopword(t) && !is_dosage_form(t));

    let first = significant.next()?;
    if significant.next().is_some() {
        return None;
    }
    Some(first.to_string())
}

/// Trim a raw capture down to the medicine name.
///
/// Cuts trailing "by X"/"from X" clauses, dosage-form words and punctuation.
/// Returns `None` when nothing meaningful is left: only stopwords, or text
/// that normalizes to nothing ("tell me the", "650mg").
pub fn clean_capture(raw: &str) -> Option<String> {
    let s = MANUFACTURER_CLAUSE.replace(raw.trim(), "");
    let s = TRAILING_NOISE.replace(&s, "");
    let s = LEADING_ARTICLE.replace(s.trim(), "");
    let s = s.trim();

    if s.is_empty() || is_dosage_form(s) || only_stopwords(s) {
        return None;
    }
    if normalize_medicine_name(s).is_empty() {
        return None;
    }
    Some(s.to_string())
}

fn only_stopwords(text: &str) -> bool {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .all(is_stopword)
}

/// Manufacturer named with "by X" or "from X".
pub fn detect_manufacturer(message: &str) -> Option<String> {
    let caps = MANUFACTURER.captures(message)?;
    let raw = caps.get(1)?.as_str();
    let raw = EARLIER_CLAUSES.replace(raw.trim(), "");
    let cleaned = TRAILING_NOISE.replace(raw.trim(), "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || is_stopword(cleaned) {
        return None;
    }
    Some(cleaned.to_string())
}

/// First dosage-form keyword in the message, canonicalized.
pub fn detect_dosage_form(message: &str) -> Option<String> {
    message
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .find_map(|token| {
            let lower = token.to_lowercase();
            DOSAGE_FORMS
                .iter()
                .find(|(kw, _)| *kw == lower)
                .map(|(_, canonical)| canonical.to_string())
        })
}

/// Extracts a [`QueryIntent`] from free text.
pub struct IntentExtractor {
    rules: Vec<IntentRule>,
    llm: Option<Arc<dyn LlmClient>>,
}

impl fmt::Debug for IntentExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntentExtractor")
            .field("rules", &self.rules)
            .field("llm", &self.llm.as_ref().map(|c| c.model_name().to_string()))
            .finish()
    }
}

impl IntentExtractor {
    /// Default rules with LLM fallback.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self::with_rules(default_rules(), Some(llm))
    }

    /// Default rules only; unmatched messages get the fallback intent.
    pub fn without_llm() -> Self {
        Self::with_rules(default_rules(), None)
    }

    pub fn with_rules(rules: Vec<IntentRule>, llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self { rules, llm }
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    /// Extract an intent. Never fails.
    pub async fn extract(&self, message: &str) -> QueryIntent {
        let message = message.trim();
        if let Some(intent) = self.extract_with_rules(message) {
            return intent;
        }

        let intent = match &self.llm {
            Some(llm) => self.extract_with_llm(llm.as_ref(), message).await,
            None => QueryIntent::fallback(),
        };
        attach_hints(intent, message)
    }

    /// Run the rule cascade only.
    pub fn extract_with_rules(&self, message: &str) -> Option<QueryIntent> {
        let message = message.trim();
        self.rules.iter().find_map(|rule| {
            let name = rule.capture(message)?;
            debug!(rule = rule.name, medicine = %name, "Intent rule matched");
            let intent = QueryIntent::new(name, rule.query_type, rule.confidence, rule.source);
            Some(attach_hints(intent, message))
        })
    }

    async fn extract_with_llm(&self, llm: &dyn LlmClient, message: &str) -> QueryIntent {
        let prompt = Prompt::new(make_intent_prompt(message)).with_system(INTENT_SYSTEM_PROMPT);
        let options = CompletionOptions::new(0.0, 300);

        let value = match llm.complete_json(prompt, options).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                warn!("LLM intent output was not a JSON object");
                return QueryIntent::fallback();
            }
            Err(e) => {
                warn!(error = %e, "LLM intent extraction failed");
                return QueryIntent::fallback();
            }
        };

        match RawIntent::from_value(value) {
            Ok(raw) => {
                let mut intent = QueryIntent::from(raw);
                intent.medicine_name = intent.medicine_name.as_deref().and_then(clean_capture);
                debug!(
                    medicine = ?intent.medicine_name,
                    query_type = %intent.query_type,
                    "LLM intent extracted"
                );
                intent
            }
            Err(e) => {
                warn!(error = %e, "LLM intent output rejected");
                QueryIntent::fallback()
            }
        }
    }
}

/// Fill manufacturer and dosage-form hints found in the message.
///
/// Hints already present win. A manufacturer equal to the medicine name is
/// dropped.
fn attach_hints(mut intent: QueryIntent, message: &str) -> QueryIntent {
    if intent.manufacturer.is_none() {
        intent.manufacturer = detect_manufacturer(message);
    }
    if intent.dosage_form.is_none() {
        intent.dosage_form = detect_dosage_form(message);
    }

    let same_as_name = match (&intent.manufacturer, &intent.medicine_name) {
        (Some(m), Some(n)) => m.eq_ignore_ascii_case(n),
        _ => false,
    };
    if same_as_name {
        intent.manufacturer = None;
    }
    intent
}
