//! Property-based negative tests for malformed producer output.
//!
//! The pipeline has no error path for bad producer text, so the invariants
//! under test are: it **never panics**, and whatever it returns is a record
//! that already conforms to its spec. Conformance is checked two ways:
//! re-normalizing the record changes nothing, and the record decodes into the
//! contract's typed view.
//!
//! Complements `fuzz/fuzz_targets/fuzz_normalize.rs` (libfuzzer), which feeds
//! arbitrary bytes. These tests use structure-aware generation: JSON built
//! from the contracts' own keys, wrapped the ways producers wrap it.

use llm_normalize_core::contracts::{self, AssistantAnswer, ChartSpec, QualityReview, VideoReview};
use llm_normalize_core::{normalize, normalize_text, scan_partial_field, Contract, SchemaSpec};
use proptest::prelude::*;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Keys the built-in contracts declare, plus a few they don't.
const KEYS: &[&str] = &[
    "response",
    "follow_ups",
    "followUps",
    "tone",
    "chart",
    "summary",
    "overall_score",
    "overallScore",
    "verdict",
    "findings",
    "severity",
    "category",
    "message",
    "suggestion",
    "score",
    "issues",
    "timestamp_seconds",
    "description",
    "chart_type",
    "title",
    "unit",
    "data",
    "label",
    "value",
    "unrelated",
];

const WORDS: &[&str] = &[
    "blocker", "medium", "nit", "pass", "approve", "bar", "pie", "upbeat", "banana", "", "  ",
    "CRITICAL",
];

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-1.0e12f64..1.0e12).prop_map(Value::from),
        prop::sample::select(WORDS).prop_map(Value::from),
        ".{0,300}".prop_map(Value::String),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(4, 64, 14, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..14).prop_map(Value::Array),
            prop::collection::vec((prop::sample::select(KEYS), inner), 0..8).prop_map(
                |entries| {
                    let map: Map<String, Value> = entries
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), v))
                        .collect();
                    Value::Object(map)
                }
            ),
        ]
    })
}

/// A document serialized and wrapped the way producers tend to wrap it.
fn arb_producer_text() -> impl Strategy<Value = String> {
    (arb_value(), 0..6usize, 0..usize::MAX).prop_map(|(value, wrapping, cut)| {
        let json = value.to_string();
        match wrapping {
            0 => json,
            1 => format!("```json\n{}\n```", json),
            2 => format!("Here you go: {} Hope that helps!", json),
            3 => format!("```\n{}", json),
            // Truncated mid-stream at a char boundary.
            4 => {
                let mut end = cut % (json.len() + 1);
                while !json.is_char_boundary(end) {
                    end -= 1;
                }
                json[..end].to_string()
            }
            _ => format!("{}{}", json, json),
        }
    })
}

fn all_specs() -> [&'static SchemaSpec; 4] {
    [
        contracts::assistant_answer(),
        contracts::quality_review(),
        contracts::video_review(),
        contracts::chart_spec(),
    ]
}

fn assert_conforms(text: &str, spec: &SchemaSpec) -> Result<(), TestCaseError> {
    let outcome = normalize_text(text, spec);
    let again = normalize(&outcome.record.to_value(), spec);
    prop_assert_eq!(&again.record, &outcome.record, "record for {:?} is not a fixed point", text);
    prop_assert_eq!(outcome.record.len(), spec.fields().len());
    Ok(())
}

fn assert_decodes<T: Contract + std::fmt::Debug>(text: &str) -> Result<(), TestCaseError> {
    let outcome = normalize_text(text, T::spec());
    let decoded = outcome.record.decode::<T>();
    prop_assert!(decoded.is_ok(), "{:?}: {:?}", text, decoded.err());
    Ok(())
}

// ===========================================================================
// Deterministic negative tests
// ===========================================================================

#[test]
fn malformed_root_is_array() {
    for spec in all_specs() {
        let outcome = normalize_text("[1, 2, 3]", spec);
        assert!(outcome.used_fallback);
    }
}

#[test]
fn malformed_deeply_nested_braces() {
    let text = format!("{}{}", "{".repeat(5000), "}".repeat(5000));
    for spec in all_specs() {
        // serde_json's recursion limit rejects this; the fallback absorbs it.
        let outcome = normalize_text(&text, spec);
        assert!(outcome.used_fallback);
    }
}

#[test]
fn malformed_unbalanced_quotes_in_prose() {
    let text = r#"He said "see {"summary": "x"} and left"#;
    let outcome = normalize_text(text, contracts::quality_review());
    assert_eq!(outcome.record.text("summary"), Some("x"));
}

#[test]
fn malformed_non_finite_numbers_are_wrong_types() {
    // NaN and Infinity are not JSON; a producer writing them gets the fallback.
    let outcome = normalize_text(r#"{"overall_score": NaN}"#, contracts::quality_review());
    assert!(outcome.used_fallback);
    assert_eq!(outcome.record.number("overall_score"), Some(0.0));
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, ..Default::default() })]

    /// Property: arbitrary text never panics and always conforms.
    #[test]
    fn arbitrary_text_always_conforms(text in ".{0,400}") {
        for spec in all_specs() {
            assert_conforms(&text, spec)?;
        }
    }

    /// Property: structured but malformed producer output always conforms.
    #[test]
    fn producer_text_always_conforms(text in arb_producer_text()) {
        for spec in all_specs() {
            assert_conforms(&text, spec)?;
        }
    }

    /// Property: every normalized record decodes into its typed view.
    #[test]
    fn normalized_records_decode(text in arb_producer_text()) {
        assert_decodes::<AssistantAnswer>(&text)?;
        assert_decodes::<QualityReview>(&text)?;
        assert_decodes::<VideoReview>(&text)?;
        assert_decodes::<ChartSpec>(&text)?;
    }

    /// Property: the scanner never panics, whatever the buffer and field.
    #[test]
    fn scanner_never_panics(buffer in ".{0,300}", field in prop::sample::select(KEYS)) {
        let _ = scan_partial_field(&buffer, field);
    }
}
