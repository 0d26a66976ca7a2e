//! Incremental field scanner: best-effort value of one string field from a
//! buffer that is still being streamed.
//!
//! The buffer is usually not parseable yet (`{"response": "Five tasks are ov`),
//! so this module never decodes JSON. It finds the field marker and decodes the
//! string value by hand, stopping at the closing quote or the end of the
//! buffer, whichever comes first.
//!
//! Only a fixed escape table is decoded:
//!
//! | Sequence | Output |
//! |----------|--------|
//! | `\"` | `"` |
//! | `\n` | newline |
//! | `\t` | tab |
//! | `\\` | `\` |
//! | `\/` | `/` |
//!
//! Every other backslash sequence (including `\uXXXX` and `\r`) is emitted
//! literally, backslash included. Callers display this text live and rely on
//! exactly this subset; do not extend it.

/// Return the current decoded value of the string field `field_name`.
///
/// Returns an empty string when the field has not appeared yet, when its
/// colon or opening quote has not arrived, or when the value is not a string
/// (number, boolean, null, object, array). Each call is independent and costs
/// O(`buffer.len()`).
pub fn scan_partial_field(buffer: &str, field_name: &str) -> String {
    let Some(value_start) = locate_string_value(buffer, field_name) else {
        return String::new();
    };
    decode_partial_string(&buffer[value_start..])
}

/// Find the byte offset just past the opening quote of the field's value.
fn locate_string_value(buffer: &str, field_name: &str) -> Option<usize> {
    let marker = format!("\"{}\"", field_name);

    for (idx, _) in buffer.match_indices(&marker) {
        let after_marker = &buffer[idx + marker.len()..];
        let rest = after_marker.trim_start();
        if rest.is_empty() {
            // Colon has not streamed in yet.
            return None;
        }
        let Some(after_colon) = rest.strip_prefix(':') else {
            // The marker was text inside some other value; keep looking.
            continue;
        };
        let value = after_colon.trim_start();
        if !value.starts_with('"') {
            return None;
        }
        let consumed = buffer.len() - value.len();
        return Some(consumed + 1);
    }

    None
}

/// Decode string content up to the first unescaped quote or end of input.
fn decode_partial_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => break,
            '\\' => match chars.next() {
                Some('"') => out.push('"'),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('/') => out.push('/'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                // Dangling backslash: the escaped character is still in flight.
                None => break,
            },
            _ => out.push(ch),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unterminated_value_returns_partial_text() {
        let buffer = r#"{"response": "Five tasks are overdue and need attent"#;
        assert_eq!(
            scan_partial_field(buffer, "response"),
            "Five tasks are overdue and need attent"
        );
    }

    #[test]
    fn test_complete_value_stops_at_closing_quote() {
        let buffer = r#"{"response": "done", "other": "ignored"}"#;
        assert_eq!(scan_partial_field(buffer, "response"), "done");
    }

    #[test]
    fn test_escaped_quotes_are_resolved() {
        let buffer = r#""response": "He said \"hi\"""#;
        assert_eq!(scan_partial_field(buffer, "response"), r#"He said "hi""#);
    }

    #[test]
    fn test_escape_table() {
        let buffer = r#"{"response": "a\nb\tc\\d\/e"}"#;
        assert_eq!(scan_partial_field(buffer, "response"), "a\nb\tc\\d/e");
    }

    #[test]
    fn test_unknown_escapes_pass_through_literally() {
        let buffer = r#"{"response": "café \r done"}"#;
        assert_eq!(
            scan_partial_field(buffer, "response"),
            r#"café \r done"#
        );
    }

    #[test]
    fn test_dangling_backslash_is_withheld() {
        let buffer = r#"{"response": "say \"#;
        assert_eq!(scan_partial_field(buffer, "response"), "say ");
    }

    #[test]
    fn test_non_string_values_return_empty() {
        assert_eq!(scan_partial_field(r#"{"response": null}"#, "response"), "");
        assert_eq!(scan_partial_field(r#"{"response": 42}"#, "response"), "");
        assert_eq!(scan_partial_field(r#"{"response": true}"#, "response"), "");
        assert_eq!(scan_partial_field(r#"{"response": {"a": 1}}"#, "response"), "");
    }

    #[test]
    fn test_field_not_yet_arrived() {
        assert_eq!(scan_partial_field("", "response"), "");
        assert_eq!(scan_partial_field(r#"{"resp"#, "response"), "");
        assert_eq!(scan_partial_field(r#"{"response""#, "response"), "");
        assert_eq!(scan_partial_field(r#"{"response": "#, "response"), "");
    }

    #[test]
    fn test_marker_inside_other_value_is_skipped() {
        let buffer = r#"{"title": "the \"response\" field", "response": "real"}"#;
        assert_eq!(scan_partial_field(buffer, "response"), "real");
    }

    #[test]
    fn test_whitespace_around_colon() {
        let buffer = "{\"response\"\n  :\n  \"spaced";
        assert_eq!(scan_partial_field(buffer, "response"), "spaced");
    }

    #[test]
    fn test_growing_buffer_is_monotonic() {
        let full = r#"{"response": "Hello \"world\", how are you?"}"#;
        let mut previous = String::new();
        for end in 0..=full.len() {
            let current = scan_partial_field(&full[..end], "response");
            assert!(
                current.starts_with(&previous),
                "prefix {:?} regressed from {:?} to {:?}",
                &full[..end],
                previous,
                current
            );
            previous = current;
        }
        assert_eq!(previous, r#"Hello "world", how are you?"#);
    }

    #[test]
    fn test_multibyte_text() {
        let buffer = r#"{"response": "naïve — 日本語"#;
        assert_eq!(scan_partial_field(buffer, "response"), "naïve — 日本語");
    }
}
