//! # llm-normalize-core
//!
//! Turns free-form, possibly malformed, possibly partial producer (LLM) output
//! into typed records that always satisfy a declared contract.
//!
//! Two phases:
//!
//! 1. **While streaming**: [`scan_partial_field`] recovers the human-readable
//!    text of one field from an incomplete buffer so it can be shown live.
//! 2. **At end of stream**: [`extract_document`] isolates the structured
//!    object (fenced, bare or prose-wrapped) and [`normalize`] projects it onto
//!    a [`SchemaSpec`]: defaults for missing fields, clamping, truncation,
//!    enum canonicalization and list cardinality.
//!
//! Nothing in the pipeline returns an error for bad producer output. Every
//! correction is reported as a [`Warning`] instead.
//!
//! ## Example
//!
//! ```rust
//! use llm_normalize_core::{normalize_text, FieldKind, FieldSpec, SchemaSpec};
//!
//! let spec = SchemaSpec::new(
//!     "answer",
//!     vec![
//!         FieldSpec::new("response", FieldKind::text()),
//!         FieldSpec::new("confidence", FieldKind::integer(0.0, 100.0)),
//!     ],
//!     Some("response"),
//! )
//! .unwrap();
//!
//! let outcome = normalize_text("```json\n{\"response\": \"Done\", \"confidence\": 140}\n```", &spec);
//! assert_eq!(outcome.record.text("response"), Some("Done"));
//! assert_eq!(outcome.record.number("confidence"), Some(100.0));
//! assert!(!outcome.used_fallback);
//! ```

pub mod canonical;
pub mod config;
pub mod constraints;
pub mod contracts;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod normalizer;
pub mod record;
pub mod schema;
pub mod schema_utils;
pub mod scanner;
pub mod stream;
pub mod warning;

use serde::Serialize;

pub use canonical::{canonicalize, Canonicalized, Resolution, SynonymTable, SynonymTableBuilder};
pub use config::ExtractOptions;
pub use constraints::{CardinalityPolicy, RangePolicy};
pub use contracts::{parse, Contract, Parsed};
pub use error::SpecError;
pub use extract::{extract_document, extract_document_with, Extraction, Source};
pub use metrics::{confidence, count_by_category};
pub use normalizer::{default_for, normalize, Normalized};
pub use record::{FieldValue, Record};
pub use scanner::scan_partial_field;
pub use schema::{FieldKind, FieldSpec, SchemaSpec};
pub use schema_utils::{child_path, escape_pointer_segment};
pub use stream::StreamSession;
pub use warning::{Warning, WarningKind};

/// Result of the full end-of-stream pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub record: Record,
    pub warnings: Vec<Warning>,
    /// No candidate decoded; the record was built from the raw text.
    pub used_fallback: bool,
}

/// Extract and normalize a completed response with default options.
pub fn normalize_text(text: &str, spec: &SchemaSpec) -> Outcome {
    normalize_text_with(text, spec, &ExtractOptions::default())
}

/// Extract and normalize a completed response.
///
/// The spec's primary field receives the raw text when nothing decodes.
pub fn normalize_text_with(text: &str, spec: &SchemaSpec, options: &ExtractOptions) -> Outcome {
    let extraction = extract_document_with(text, spec.primary_field(), options);
    let used_fallback = extraction.used_fallback;
    if used_fallback {
        tracing::debug!(
            spec = %spec.name(),
            "producer output had no decodable object; using raw text"
        );
    }

    let Normalized { record, warnings } = normalize(&extraction.into_value(), spec);
    Outcome {
        record,
        warnings,
        used_fallback,
    }
}
