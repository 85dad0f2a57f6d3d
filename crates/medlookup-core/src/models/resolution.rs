//! Catalog lookup outcomes.

use serde::{Deserialize, Serialize};

use super::MedicineRecord;

/// Which lookup layer produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    Prefix,
    Substring,
}

/// A fuzzy candidate offered back to the user for confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub id: i64,
    pub name: String,
    pub manufacturer_name: Option<String>,
    #[serde(rename = "type")]
    pub dosage_form: Option<String>,
    pub price: Option<f64>,
    /// Similarity to the search term (0 - 100)
    pub score: f64,
}

impl Suggestion {
    pub fn from_record(record: &MedicineRecord, score: f64) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            manufacturer_name: record.manufacturer_name.clone(),
            dosage_form: record.dosage_form.clone(),
            price: record.price,
            score,
        }
    }
}

/// Result of resolving an intent against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// An exact, prefix or substring layer matched
    Resolved {
        matches: Vec<MedicineRecord>,
        strategy: MatchStrategy,
    },
    /// Only fuzzy candidates above the threshold, best first
    Suggestions(Vec<Suggestion>),
    /// Nothing in the catalog resembles the query
    Empty,
}

impl Resolution {
    /// The best match, when one was resolved.
    pub fn primary(&self) -> Option<&MedicineRecord> {
        match self {
            Resolution::Resolved { matches, .. } => matches.first(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Resolution::Empty)
    }
}
