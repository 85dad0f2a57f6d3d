//! Golden tests for the resolver's text handling.
//!
//! These tests verify normalization and intent extraction against known
//! cases.

use medlookup_core::models::{IntentSource, QueryType};
use medlookup_core::resolver::{normalize_medicine_name, IntentExtractor};

/// Test case from golden file.
struct GoldenCase {
    id: &'static str,
    message: &'static str,
    expected_name: &'static str,
    expected_query_type: QueryType,
    expected_source: IntentSource,
    expected_manufacturer: Option<&'static str>,
    expected_dosage_form: Option<&'static str>,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "price-question",
            message: "What is the price of Dolo 650?",
            expected_name: "Dolo 650",
            expected_query_type: QueryType::Price,
            expected_source: IntentSource::Pattern,
            expected_manufacturer: None,
            expected_dosage_form: None,
        },
        GoldenCase {
            id: "price-how-much",
            message: "How much is Pan 40?",
            expected_name: "Pan 40",
            expected_query_type: QueryType::Price,
            expected_source: IntentSource::Pattern,
            expected_manufacturer: None,
            expected_dosage_form: None,
        },
        GoldenCase {
            id: "price-suffix",
            message: "crocin advance price",
            expected_name: "crocin advance",
            expected_query_type: QueryType::Price,
            expected_source: IntentSource::Pattern,
            expected_manufacturer: None,
            expected_dosage_form: None,
        },
        GoldenCase {
            id: "composition",
            message: "composition of Augmentin 625 Duo",
            expected_name: "Augmentin 625 Duo",
            expected_query_type: QueryType::Composition,
            expected_source: IntentSource::Pattern,
            expected_manufacturer: None,
            expected_dosage_form: None,
        },
        GoldenCase {
            id: "alternatives-by-manufacturer",
            message: "Show alternatives to Azithral by Alembic",
            expected_name: "Azithral",
            expected_query_type: QueryType::Alternatives,
            expected_source: IntentSource::Pattern,
            expected_manufacturer: Some("Alembic"),
            expected_dosage_form: None,
        },
        GoldenCase {
            id: "alternatives-for",
            message: "Alternatives for Crocin by GSK",
            expected_name: "Crocin",
            expected_query_type: QueryType::Alternatives,
            expected_source: IntentSource::Pattern,
            expected_manufacturer: Some("GSK"),
            expected_dosage_form: None,
        },
        GoldenCase {
            id: "side-effects-with-form",
            message: "side effects of Allegra 120mg tablet",
            expected_name: "Allegra 120mg",
            expected_query_type: QueryType::SideEffects,
            expected_source: IntentSource::Pattern,
            expected_manufacturer: None,
            expected_dosage_form: Some("tablet"),
        },
        GoldenCase {
            id: "capitalized-name",
            message: "Tell me about Allegra 120mg tablet",
            expected_name: "Allegra 120mg",
            expected_query_type: QueryType::FullDetails,
            expected_source: IntentSource::Heuristic,
            expected_manufacturer: None,
            expected_dosage_form: Some("tablet"),
        },
        GoldenCase {
            id: "lowercase-name-with-dose",
            message: "dolo 650",
            expected_name: "dolo 650",
            expected_query_type: QueryType::FullDetails,
            expected_source: IntentSource::Heuristic,
            expected_manufacturer: None,
            expected_dosage_form: None,
        },
        GoldenCase {
            id: "misspelled-single-word",
            message: "paracetmol tablet",
            expected_name: "paracetmol",
            expected_query_type: QueryType::FullDetails,
            expected_source: IntentSource::Heuristic,
            expected_manufacturer: None,
            expected_dosage_form: Some("tablet"),
        },
    ]
}

#[test]
fn test_golden_cases() {
    let extractor = IntentExtractor::without_llm();

    for case in get_golden_cases() {
        let intent = extractor
            .extract_with_rules(case.message)
            .unwrap_or_else(|| panic!("Case {}: no rule matched", case.id));

        assert_eq!(
            intent.medicine_name.as_deref(), Some(case.expected_name),
            "Case {}: name mismatch", case.id
        );
        assert_eq!(
            intent.query_type, case.expected_query_type,
            "Case {}: query type mismatch", case.id
        );
        assert_eq!(
            intent.source, case.expected_source,
            "Case {}: source mismatch", case.id
        );
        assert_eq!(
            intent.manufacturer.as_deref(), case.expected_manufacturer,
            "Case {}: manufacturer mismatch", case.id
        );
        assert_eq!(
            intent.dosage_form.as_deref(), case.expected_dosage_form,
            "Case {}: dosage form mismatch", case.id
        );
    }
}

#[test]
fn test_all_normalizations() {
    let normalization_tests = vec![
        ("What is the price of Paracetamol 500mg", "Paracetamol"),
        ("tell me about Allegra?", "Allegra"),
        ("Side effects of Azithral", "Azithral"),
        ("Dolo 650 mg", "Dolo"),
        ("Benadryl 5 ml", "Benadryl"),
        ("Crocin 10 tablets", "Crocin"),
        ("Augmentin 625 Duo", "Augmentin 625 Duo"),
        ("B-Complex (Forte)", "B Complex Forte"),
        ("  Vitamin   D3  ", "Vitamin D3"),
        ("Theophylline", "Theophylline"),
    ];

    for (input, expected) in normalization_tests {
        let result = normalize_medicine_name(input);
        assert_eq!(
            result, expected,
            "{:?} should normalize to {:?}, got {:?}",
            input, expected, result
        );
    }
}

#[test]
fn test_vague_messages_match_no_rule() {
    let extractor = IntentExtractor::without_llm();

    for message in [
        "tell me something good please",
        "what is the price",
        "what is the cost of it",
    ] {
        let intent = extractor.extract_with_rules(message);
        assert!(
            intent.as_ref().map_or(true, |i| i.query_type != QueryType::Price),
            "{:?} should not yield a price intent, got {:?}",
            message, intent
        );
    }
}
