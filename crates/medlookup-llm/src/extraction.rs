//! Query intent extraction from LLM output.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Query types the model is allowed to report.
pub const QUERY_TYPES: &[&str] = &[
    "price",
    "composition",
    "side_effects",
    "alternatives",
    "full_details",
];

/// Extraction errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Intent exactly as the model reported it, after shape validation.
///
/// Field names follow the JSON contract given in the extraction prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawIntent {
    #[serde(default)]
    pub medicine_name: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default, rename = "type")]
    pub dosage_form: Option<String>,
    #[serde(default)]
    pub query_type: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl RawIntent {
    /// Validate a parsed JSON object against the extraction contract.
    ///
    /// Wrong field types, unknown fields and unknown query types are all
    /// rejected. Blank strings and the literal `"null"` are read as absent.
    pub fn from_value(value: Value) -> ExtractionResult<Self> {
        if !value.is_object() {
            return Err(ExtractionError::InvalidFormat(
                "Expected a JSON object".into(),
            ));
        }

        let mut raw: RawIntent = serde_json::from_value(value)?;
        raw.medicine_name = blank_to_none(raw.medicine_name);
        raw.manufacturer = blank_to_none(raw.manufacturer);
        raw.dosage_form = blank_to_none(raw.dosage_form);
        raw.query_type = blank_to_none(raw.query_type).map(|q| q.to_lowercase());

        if let Some(query_type) = &raw.query_type {
            if !QUERY_TYPES.contains(&query_type.as_str()) {
                return Err(ExtractionError::InvalidFormat(format!(
                    "Unknown query_type: {}",
                    query_type
                )));
            }
        }

        if let Some(confidence) = raw.confidence {
            if !confidence.is_finite() {
                return Err(ExtractionError::InvalidFormat(
                    "confidence must be a finite number".into(),
                ));
            }
        }

        Ok(raw)
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
}

/// Find and parse the JSON object in a model reply.
///
/// Models sometimes wrap the object in prose or a code fence, so the first
/// `{` through the last `}` is taken.
pub fn parse_json_object(text: &str) -> ExtractionResult<Value> {
    let json_start = text.find('{').ok_or_else(|| {
        ExtractionError::InvalidFormat("No JSON object found in response".into())
    })?;
    let json_end = text.rfind('}').ok_or_else(|| {
        ExtractionError::InvalidFormat("No closing brace found in response".into())
    })?;
    if json_end < json_start {
        return Err(ExtractionError::InvalidFormat(
            "Closing brace precedes opening brace".into(),
        ));
    }

    let value: Value = serde_json::from_str(&text[json_start..=json_end])?;
    if !value.is_object() {
        return Err(ExtractionError::InvalidFormat(
            "Expected a JSON object".into(),
        ));
    }
    Ok(value)
}

/// Parse a model reply straight into a validated intent.
pub fn parse_intent_output(text: &str) -> ExtractionResult<RawIntent> {
    RawIntent::from_value(parse_json_object(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_parse_intent_output() {
        let text = r#"{"medicine_name":"Allegra 120mg","manufacturer":null,"type":"tablet","query_type":"side_effects","confidence":0.95}"#;

        let raw = parse_intent_output(text).unwrap();
        assert_eq!(raw.medicine_name.as_deref(), Some("Allegra 120mg"));
        assert_eq!(raw.manufacturer, None);
        assert_eq!(raw.dosage_form.as_deref(), Some("tablet"));
        assert_eq!(raw.query_type.as_deref(), Some("side_effects"));
        assert_eq!(raw.confidence, Some(0.95));
    }

    #[test]
    fn test_parse_intent_output_with_prefix() {
        let text = "Here is the JSON you asked for:\n```json\n{\"medicine_name\":\"Crocin\",\"query_type\":\"price\"}\n```";

        let raw = parse_intent_output(text).unwrap();
        assert_eq!(raw.medicine_name.as_deref(), Some("Crocin"));
        assert_eq!(raw.query_type.as_deref(), Some("price"));
    }

    #[test]
    fn test_unknown_query_type_rejected() {
        let value = json!({"medicine_name": "Crocin", "query_type": "dosage"});
        assert!(matches!(
            RawIntent::from_value(value),
            Err(ExtractionError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_wrong_field_type_rejected() {
        let value = json!({"medicine_name": 42, "query_type": "price"});
        assert!(matches!(
            RawIntent::from_value(value),
            Err(ExtractionError::JsonParse(_))
        ));

        let value = json!({"medicine_name": "Crocin", "confidence": "high"});
        assert!(RawIntent::from_value(value).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let value = json!({"medicine_name": "Crocin", "dose": "650mg"});
        assert!(RawIntent::from_value(value).is_err());
    }

    #[test]
    fn test_blank_strings_are_absent() {
        let value = json!({"medicine_name": "  ", "manufacturer": "null", "query_type": "PRICE"});
        let raw = RawIntent::from_value(value).unwrap();
        assert_eq!(raw.medicine_name, None);
        assert_eq!(raw.manufacturer, None);
        assert_eq!(raw.query_type.as_deref(), Some("price"));
    }

    #[test]
    fn test_no_object_found() {
        assert!(parse_json_object("no json here").is_err());
        assert!(parse_json_object("} backwards {").is_err());
    }

    proptest! {
        #[test]
        fn parse_json_object_never_panics(text in ".{0,200}") {
            let _ = parse_json_object(&text);
        }
    }
}
