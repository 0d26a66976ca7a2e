//! Document extraction: isolate and decode the single structured object in a
//! completed producer response.
//!
//! Producers wrap their payload in many ways:
//!
//! ~~~text
//! {"response": "..."}                         bare
//! ```json\n{"response": "..."}\n```           fenced, with a language annotation
//! Sure! Here you go: {"response": "..."} 🙂   prose-wrapped
//! ~~~
//!
//! Candidates are tried in order (fenced block interiors, the whole input,
//! then balanced `{...}` spans in the prose) and the first one that decodes to
//! a JSON object wins. When nothing decodes, a fallback object carrying the raw
//! text in the primary field is synthesized so the user-visible content
//! degrades gracefully instead of vanishing. Decode failures are absorbed and
//! logged, never returned.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ExtractOptions;

/// A fenced block: three backticks, an optional language annotation, then
/// everything up to the closing fence (or the end of input if unterminated).
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*[A-Za-z0-9_+.\-]*[ \t]*\r?\n?(.*?)(?:```|\z)")
        .expect("invariant: fenced block pattern is a valid regex")
});

/// Where the extracted object came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Fenced,
    Whole,
    Prose,
    Fallback,
}

/// Result of [`extract_document`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub object: Map<String, Value>,
    pub used_fallback: bool,
    pub source: Source,
}

impl Extraction {
    pub fn into_value(self) -> Value {
        Value::Object(self.object)
    }
}

/// Extract the structured object from `text` with default options.
///
/// `primary_field` names the field that receives the raw input when no
/// candidate decodes; with `None` the fallback object is empty.
pub fn extract_document(text: &str, primary_field: Option<&str>) -> Extraction {
    extract_document_with(text, primary_field, &ExtractOptions::default())
}

/// Extract the structured object from `text`.
pub fn extract_document_with(
    text: &str,
    primary_field: Option<&str>,
    options: &ExtractOptions,
) -> Extraction {
    for block in fenced_blocks(text) {
        if let Some(object) = decode_object(block) {
            return found(object, Source::Fenced);
        }
    }

    if let Some(object) = decode_object(text) {
        return found(object, Source::Whole);
    }

    if options.scan_prose {
        for span in brace_spans(text).take(options.max_candidates) {
            if let Some(object) = decode_object(span) {
                return found(object, Source::Prose);
            }
        }
    }

    tracing::debug!(
        len = text.len(),
        "no decodable object in producer text; using fallback"
    );

    let mut object = Map::new();
    if let Some(field) = primary_field {
        object.insert(field.to_string(), Value::String(text.to_string()));
    }
    Extraction {
        object,
        used_fallback: true,
        source: Source::Fallback,
    }
}

fn found(object: Map<String, Value>, source: Source) -> Extraction {
    Extraction {
        object,
        used_fallback: false,
        source,
    }
}

/// Decode `candidate` as a JSON object. Other JSON values count as failures.
fn decode_object(candidate: &str) -> Option<Map<String, Value>> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            tracing::debug!(kind = other_kind(&other), "candidate decoded to a non-object");
            None
        }
        Err(err) => {
            tracing::debug!(error = %err, "candidate failed to decode");
            None
        }
    }
}

fn other_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Interiors of every fenced block, in order of appearance.
fn fenced_blocks(text: &str) -> impl Iterator<Item = &str> {
    FENCED_BLOCK
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Outermost balanced `{...}` spans, skipping braces inside JSON strings.
///
/// A `{` that never closes is treated as prose: scanning resumes just after
/// it so later balanced objects are still found.
fn brace_spans(text: &str) -> impl Iterator<Item = &str> {
    let mut spans = Vec::new();
    let mut from = 0;

    while let Some(offset) = text[from..].find('{') {
        let begin = from + offset;
        match balanced_end(text, begin) {
            Some(end) => {
                spans.push(&text[begin..end]);
                from = end;
            }
            None => from = begin + 1,
        }
    }

    spans.into_iter()
}

/// Byte offset just past the `}` closing the brace at `begin`, if any.
fn balanced_end(text: &str, begin: usize) -> Option<usize> {
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escape = false;

    for (index, ch) in text[begin..].char_indices() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(begin + index + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test fixture must be an object"),
        }
    }

    #[test]
    fn test_bare_document() {
        let result = extract_document(r#"{"response": "hi"}"#, Some("response"));
        assert!(!result.used_fallback);
        assert_eq!(result.source, Source::Whole);
        assert_eq!(result.object, object(json!({"response": "hi"})));
    }

    #[test]
    fn test_fenced_with_and_without_language() {
        let raw = r#"{"score": 3, "tags": ["a"]}"#;
        let bare = extract_document(raw, None);
        for wrapped in [
            format!("```json\n{}\n```", raw),
            format!("```\n{}\n```", raw),
            format!("Here it is:\n```JSON\n{}\n```\nThanks!", raw),
            format!("```json {}```", raw),
        ] {
            let fenced = extract_document(&wrapped, None);
            assert_eq!(fenced.source, Source::Fenced, "{}", wrapped);
            assert_eq!(fenced.object, bare.object, "{}", wrapped);
        }
    }

    #[test]
    fn test_unterminated_fence() {
        let result = extract_document("```json\n{\"a\": 1}\n", None);
        assert_eq!(result.source, Source::Fenced);
        assert_eq!(result.object, object(json!({"a": 1})));
    }

    #[test]
    fn test_non_json_fence_is_skipped() {
        let text = "```python\nprint('x')\n```\n\n```json\n{\"a\": 2}\n```";
        let result = extract_document(text, None);
        assert_eq!(result.object, object(json!({"a": 2})));
    }

    #[test]
    fn test_prose_wrapped_object() {
        let text = r#"Sure! Here is the review: {"summary": "ok {not a brace}", "n": 1} Hope that helps."#;
        let result = extract_document(text, Some("summary"));
        assert_eq!(result.source, Source::Prose);
        assert_eq!(
            result.object,
            object(json!({"summary": "ok {not a brace}", "n": 1}))
        );
    }

    #[test]
    fn test_prose_scanning_can_be_disabled() {
        let text = r#"Result: {"n": 1}"#;
        let options = ExtractOptions {
            scan_prose: false,
            ..ExtractOptions::default()
        };
        let result = extract_document_with(text, Some("response"), &options);
        assert!(result.used_fallback);
    }

    #[test]
    fn test_fallback_carries_raw_text() {
        let text = "I could not produce JSON, sorry.";
        let result = extract_document(text, Some("response"));
        assert!(result.used_fallback);
        assert_eq!(result.source, Source::Fallback);
        assert_eq!(result.object, object(json!({"response": text})));
    }

    #[test]
    fn test_non_object_json_falls_back() {
        let result = extract_document("[1, 2, 3]", Some("response"));
        assert!(result.used_fallback);
        assert_eq!(result.object["response"], "[1, 2, 3]");
    }

    #[test]
    fn test_truncated_document_falls_back() {
        let text = r#"{"response": "Five tasks are overdue"#;
        let result = extract_document(text, Some("response"));
        assert!(result.used_fallback);
        assert_eq!(result.object["response"], text);
    }

    #[test]
    fn test_empty_input_fallback_without_primary() {
        let result = extract_document("", None);
        assert!(result.used_fallback);
        assert!(result.object.is_empty());
    }

    #[test]
    fn test_brace_spans_are_outermost() {
        let spans: Vec<&str> = brace_spans(r#"a {"x": {"y": "}"}} b {"z": 1} c {"#).collect();
        assert_eq!(spans, vec![r#"{"x": {"y": "}"}}"#, r#"{"z": 1}"#]);
    }

    #[test]
    fn test_unclosed_brace_does_not_hide_later_objects() {
        let text = r#"Sure {thinking... here is the result: {"summary": "ok", "overall_score": 80}"#;
        let spans: Vec<&str> = brace_spans(text).collect();
        assert_eq!(spans, vec![r#"{"summary": "ok", "overall_score": 80}"#]);

        let result = extract_document(text, Some("summary"));
        assert!(!result.used_fallback);
        assert_eq!(result.source, Source::Prose);
        assert_eq!(
            result.object,
            object(json!({"summary": "ok", "overall_score": 80}))
        );
    }
}
