//! Medicine catalog models.

use serde::{Deserialize, Serialize};

/// A single sellable medicine pack in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineRecord {
    /// Stable catalog identifier
    pub id: i64,
    /// Brand name, usually with strength (e.g., "Dolo 650mg Tablet")
    pub name: String,
    /// Maximum retail price, if known
    #[serde(default)]
    pub price: Option<f64>,
    /// Discontinued items never appear as alternatives
    #[serde(default)]
    pub is_discontinued: bool,
    #[serde(default)]
    pub manufacturer_name: Option<String>,
    /// Dosage form (e.g., "tablet", "syrup")
    #[serde(default, rename = "type")]
    pub dosage_form: Option<String>,
    /// Pack description (e.g., "strip of 15 tablets")
    #[serde(default)]
    pub pack_size_label: Option<String>,
    /// Primary active ingredient with strength
    #[serde(default)]
    pub short_composition1: Option<String>,
    /// Secondary active ingredient with strength
    #[serde(default)]
    pub short_composition2: Option<String>,
    #[serde(default)]
    pub salt_composition: Option<String>,
    #[serde(default, rename = "medicine_desc", alias = "description")]
    pub description: Option<String>,
    /// Comma-separated side effects
    #[serde(default)]
    pub side_effects: Option<String>,
    /// Free-form interaction data, kept as imported
    #[serde(default)]
    pub drug_interactions: Option<serde_json::Value>,
}

impl MedicineRecord {
    /// Create a record with only the required fields.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            price: None,
            is_discontinued: false,
            manufacturer_name: None,
            dosage_form: None,
            pack_size_label: None,
            short_composition1: None,
            short_composition2: None,
            salt_composition: None,
            description: None,
            side_effects: None,
            drug_interactions: None,
        }
    }

    /// Whether any composition field is present, i.e. alternatives can be looked up.
    pub fn has_composition(&self) -> bool {
        non_blank(&self.short_composition1).is_some() || non_blank(&self.salt_composition).is_some()
    }

    /// Compact projection sent to the LLM.
    pub fn summary(&self) -> MedicineSummary {
        MedicineSummary {
            name: self.name.clone(),
            dosage_form: self.dosage_form.clone(),
            pack_size_label: self.pack_size_label.clone(),
            price: self.price,
            manufacturer_name: self.manufacturer_name.clone(),
            is_discontinued: self.is_discontinued,
            short_composition1: self.short_composition1.clone(),
            short_composition2: self.short_composition2.clone(),
            salt_composition: self.salt_composition.clone(),
            description: self.description.clone(),
            side_effects: self.side_effects.clone(),
            drug_interactions: self.drug_interactions.clone(),
        }
    }
}

/// The fields of a record the answer prompt is allowed to use.
///
/// Missing values serialize as `null` so the model can say
/// "Information not available" for them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub dosage_form: Option<String>,
    pub pack_size_label: Option<String>,
    pub price: Option<f64>,
    pub manufacturer_name: Option<String>,
    pub is_discontinued: bool,
    pub short_composition1: Option<String>,
    pub short_composition2: Option<String>,
    pub salt_composition: Option<String>,
    #[serde(rename = "medicine_desc")]
    pub description: Option<String>,
    pub side_effects: Option<String>,
    pub drug_interactions: Option<serde_json::Value>,
}

/// Trimmed value, or `None` when blank.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
