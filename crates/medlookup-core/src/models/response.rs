//! Caller-facing response payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MedicineRecord, QueryIntent, Suggestion};

/// Feature label reported in response metadata.
pub const FEATURE_NAME: &str = "Medicine Assistant";

/// How a query was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Answered from a catalog record
    Answered,
    /// Only fuzzy candidates; the user must confirm one
    Suggestions,
    /// Not in the catalog; answered from model knowledge, unverified
    GeneralKnowledge,
    /// Input did not look like a medicine query
    Rejected,
    /// No medicine name could be identified
    Unidentified,
}

impl Outcome {
    /// Whether responses with this outcome are worth caching.
    pub fn is_cacheable(&self) -> bool {
        matches!(
            self,
            Outcome::Answered | Outcome::Suggestions | Outcome::GeneralKnowledge
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub feature: String,
    pub model: String,
    pub outcome: Outcome,
    pub generated_at: DateTime<Utc>,
}

/// Response to a medicine query. camelCase on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicineResponse {
    pub success: bool,
    pub reply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryIntent>,
    #[serde(default)]
    pub matches: Vec<MedicineRecord>,
    #[serde(default)]
    pub alternatives: Vec<MedicineRecord>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub awaiting_confirmation: bool,
    /// Candidate names offered for confirmation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// The scored candidates behind `suggestions`, same order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestion_details: Vec<Suggestion>,
    /// `Some(false)` for answers that did not come from the catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
    pub metadata: ResponseMetadata,
}

impl MedicineResponse {
    /// Empty response with the given outcome; callers fill in the rest.
    pub fn new(success: bool, reply: impl Into<String>, model: &str, outcome: Outcome) -> Self {
        Self {
            success,
            reply: reply.into(),
            query: None,
            matches: Vec::new(),
            alternatives: Vec::new(),
            awaiting_confirmation: false,
            suggestions: Vec::new(),
            suggestion_details: Vec::new(),
            verified: None,
            examples: Vec::new(),
            tip: None,
            metadata: ResponseMetadata {
                feature: FEATURE_NAME.to_string(),
                model: model.to_string(),
                outcome,
                generated_at: Utc::now(),
            },
        }
    }

    pub fn outcome(&self) -> Outcome {
        self.metadata.outcome
    }

    /// Offer fuzzy candidates for the user to confirm.
    pub fn with_suggestions(mut self, suggestions: Vec<Suggestion>) -> Self {
        self.awaiting_confirmation = true;
        self.suggestions = suggestions.iter().map(|s| s.name.clone()).collect();
        self.suggestion_details = suggestions;
        self
    }
}
