//! Catalog import from JSON exports.
//!
//! Rows are read leniently: numbers may arrive as strings ("₹30.50"), flags
//! as "yes"/"1", and several columns have alternate names. Rows without a
//! name are dropped; duplicate ids keep the last row.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::MedicineRecord;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON array of medicine rows")]
    NotAnArray,
}

pub type ImportResult<T> = Result<T, ImportError>;

/// Outcome of parsing an export.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportBatch {
    /// Records to store, ordered by id
    pub records: Vec<MedicineRecord>,
    pub rows_read: usize,
    /// Rows without a usable name or id
    pub dropped: usize,
    /// Rows replaced by a later row with the same id
    pub duplicates: usize,
}

/// Read and parse an export file.
pub fn read_catalog_file<P: AsRef<Path>>(path: P) -> ImportResult<ImportBatch> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let batch = parse_catalog(&text)?;
    info!(
        path = %path.display(),
        rows = batch.rows_read,
        kept = batch.records.len(),
        dropped = batch.dropped,
        duplicates = batch.duplicates,
        "Catalog file parsed"
    );
    Ok(batch)
}

/// Parse a JSON array of catalog rows.
///
/// When no row carries an id, ids are assigned in file order starting at 1.
pub fn parse_catalog(json: &str) -> ImportResult<ImportBatch> {
    let rows = match serde_json::from_str::<Value>(json)? {
        Value::Array(rows) => rows,
        _ => return Err(ImportError::NotAnArray),
    };
    let rows_read = rows.len();

    let named: Vec<(Option<i64>, MedicineRecord)> = rows
        .iter()
        .filter_map(Value::as_object)
        .filter_map(map_row)
        .collect();
    let any_ids = named.iter().any(|(id, _)| id.is_some());

    let mut by_id: BTreeMap<i64, MedicineRecord> = BTreeMap::new();
    let mut duplicates = 0;
    for (index, (id, mut record)) in named.into_iter().enumerate() {
        let id = match (id, any_ids) {
            (Some(id), _) => id,
            (None, false) => index as i64 + 1,
            (None, true) => continue,
        };
        record.id = id;
        if by_id.insert(id, record).is_some() {
            duplicates += 1;
        }
    }

    let records: Vec<MedicineRecord> = by_id.into_values().collect();
    let dropped = rows_read - records.len() - duplicates;
    debug!(rows_read, kept = records.len(), dropped, duplicates, "Parsed catalog rows");

    Ok(ImportBatch {
        records,
        rows_read,
        dropped,
        duplicates,
    })
}

/// A record and its id, or `None` when the row has no name.
fn map_row(row: &Map<String, Value>) -> Option<(Option<i64>, MedicineRecord)> {
    let name = text(row, &["name", "medicine_name"])?;

    let mut record = MedicineRecord::new(0, name);
    record.price = row.get("price").and_then(number);
    record.is_discontinued = row.get("is_discontinued").map(flag).unwrap_or(false);
    record.manufacturer_name = text(row, &["manufacturer_name", "manufacturer"]);
    record.dosage_form = text(row, &["type", "category"]);
    record.pack_size_label = text(row, &["pack_size_label", "pack_size"]);
    record.short_composition1 = text(row, &["short_composition1", "composition1"]);
    record.short_composition2 = text(row, &["short_composition2", "composition2"]);
    record.salt_composition = text(row, &["salt_composition"]);
    record.description = text(row, &["medicine_desc", "description"]);
    record.side_effects = text(row, &["side_effects"]);
    record.drug_interactions = row
        .get("drug_interactions")
        .filter(|v| !v.is_null())
        .cloned();

    Some((row.get("id").and_then(integer), record))
}

/// First non-blank value among `keys`, trimmed.
fn text(row: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let s = match row.get(*key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!s.is_empty()).then_some(s)
    })
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let digits: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
            digits.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            let digits: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '-').collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "y"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_lenient_row_mapping() {
        let batch = parse_catalog(
            r#"[{
                "id": "12",
                "medicine_name": "  Dolo 650 ",
                "price": "₹30.50",
                "is_discontinued": "No",
                "manufacturer": "Micro Labs",
                "type": "allopathy",
                "pack_size": "strip of 15 tablets",
                "composition1": "Paracetamol (650mg)",
                "short_composition2": "",
                "drug_interactions": {"drug": ["Warfarin"]}
            }]"#,
        )
        .unwrap();

        assert_eq!(batch.records.len(), 1);
        let r = &batch.records[0];
        assert_eq!(r.id, 12);
        assert_eq!(r.name, "Dolo 650");
        assert_eq!(r.price, Some(30.5));
        assert!(!r.is_discontinued);
        assert_eq!(r.manufacturer_name.as_deref(), Some("Micro Labs"));
        assert_eq!(r.pack_size_label.as_deref(), Some("strip of 15 tablets"));
        assert_eq!(r.short_composition1.as_deref(), Some("Paracetamol (650mg)"));
        assert!(r.short_composition2.is_none());
        assert!(r.drug_interactions.is_some());
    }

    #[test]
    fn test_drops_nameless_and_dedupes_last_wins() {
        let batch = parse_catalog(
            r#"[
                {"id": 1, "name": "Crocin", "price": 20},
                {"id": 2, "name": "   "},
                {"id": 3},
                {"id": 1, "name": "Crocin Advance", "price": 25},
                {"name": "No Id"},
                "not an object"
            ]"#,
        )
        .unwrap();

        assert_eq!(batch.rows_read, 6);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].name, "Crocin Advance");
        assert_eq!(batch.duplicates, 1);
        assert_eq!(batch.dropped, 4);
    }

    #[test]
    fn test_assigns_ids_when_none_present() {
        let batch = parse_catalog(r#"[{"name": "A"}, {"name": "B"}]"#).unwrap();
        let ids: Vec<i64> = batch.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_flags() {
        assert!(flag(&Value::from("Yes")));
        assert!(flag(&Value::from(1)));
        assert!(flag(&Value::Bool(true)));
        assert!(!flag(&Value::from("false")));
        assert!(!flag(&Value::Null));
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(matches!(parse_catalog(r#"{"name": "x"}"#), Err(ImportError::NotAnArray)));
        assert!(matches!(parse_catalog("not json"), Err(ImportError::Json(_))));
    }

    #[test]
    fn test_read_catalog_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": 7, "name": "Allegra 120mg"}}]"#).unwrap();

        let batch = read_catalog_file(file.path()).unwrap();
        assert_eq!(batch.records[0].id, 7);

        let missing = read_catalog_file("/nonexistent/medicines.json");
        assert!(matches!(missing, Err(ImportError::Io { .. })));
    }
}
