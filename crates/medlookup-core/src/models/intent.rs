//! Query intent models.

use std::fmt;

use medlookup_llm::RawIntent;
use serde::{Deserialize, Serialize};

/// Lowest confidence an LLM-derived intent may carry.
pub const LLM_MIN_CONFIDENCE: f64 = 0.3;

/// Highest confidence an LLM-derived intent may carry.
pub const LLM_MAX_CONFIDENCE: f64 = 0.7;

/// Confidence of the intent returned when extraction fails entirely.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Which aspect of a medicine the user is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Price,
    Composition,
    SideEffects,
    Alternatives,
    #[default]
    FullDetails,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Price => "price",
            QueryType::Composition => "composition",
            QueryType::SideEffects => "side_effects",
            QueryType::Alternatives => "alternatives",
            QueryType::FullDetails => "full_details",
        }
    }

    /// Parse the wire name; unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "price" => Some(QueryType::Price),
            "composition" => Some(QueryType::Composition),
            "side_effects" => Some(QueryType::SideEffects),
            "alternatives" => Some(QueryType::Alternatives),
            "full_details" => Some(QueryType::FullDetails),
            _ => None,
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an intent came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentSource {
    /// A semantic phrasing rule matched
    Pattern,
    /// A name-shape heuristic matched
    Heuristic,
    /// The LLM extracted it
    Llm,
    /// Nothing worked
    Fallback,
}

/// Structured reading of a user's medicine query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryIntent {
    /// Medicine name as captured; `None` when no medicine could be identified
    pub medicine_name: Option<String>,
    /// Manufacturer hint (e.g., "by Cipla")
    pub manufacturer: Option<String>,
    /// Dosage-form hint (e.g., "tablet")
    #[serde(rename = "type")]
    pub dosage_form: Option<String>,
    pub query_type: QueryType,
    /// Extraction confidence (0.0 - 1.0)
    pub confidence: f64,
    pub source: IntentSource,
}

impl QueryIntent {
    /// Intent for a named medicine.
    pub fn new(
        medicine_name: impl Into<String>,
        query_type: QueryType,
        confidence: f64,
        source: IntentSource,
    ) -> Self {
        Self {
            medicine_name: Some(medicine_name.into()),
            manufacturer: None,
            dosage_form: None,
            query_type,
            confidence,
            source,
        }
    }

    /// The intent used when extraction fails: full details, no medicine.
    pub fn fallback() -> Self {
        Self {
            medicine_name: None,
            manufacturer: None,
            dosage_form: None,
            query_type: QueryType::FullDetails,
            confidence: FALLBACK_CONFIDENCE,
            source: IntentSource::Fallback,
        }
    }

    /// Whether a medicine name was identified.
    pub fn has_medicine(&self) -> bool {
        self.medicine_name
            .as_deref()
            .map(|n| !n.trim().is_empty())
            .unwrap_or(false)
    }
}

impl From<RawIntent> for QueryIntent {
    /// LLM output is never trusted above [`LLM_MAX_CONFIDENCE`].
    fn from(raw: RawIntent) -> Self {
        let query_type = raw
            .query_type
            .as_deref()
            .and_then(QueryType::parse)
            .unwrap_or_default();
        let confidence = raw
            .confidence
            .unwrap_or(LLM_MIN_CONFIDENCE)
            .clamp(LLM_MIN_CONFIDENCE, LLM_MAX_CONFIDENCE);

        Self {
            medicine_name: raw.medicine_name,
            manufacturer: raw.manufacturer,
            dosage_form: raw.dosage_form.map(|t| t.to_lowercase()),
            query_type,
            confidence,
            source: IntentSource::Llm,
        }
    }
}
