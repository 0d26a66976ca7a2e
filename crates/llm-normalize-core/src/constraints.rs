//! Range clamping and validation primitives.
//!
//! Three policies, one per field kind, and they are not interchangeable:
//! - continuous numbers are clamped to the nearest bound, never rejected;
//! - free text is truncated to its maximum length, never rejected;
//! - bounded collections are checked for cardinality and, when out of bounds,
//!   rejected as a whole (or truncated where the field opts into it).

use serde::{Deserialize, Serialize};

/// What to do with a number outside its bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangePolicy {
    /// Pull the value to the nearest bound.
    #[default]
    Clamp,
    /// Treat the value as absent.
    Reject,
}

/// What to do with a list whose valid element count is out of bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardinalityPolicy {
    /// Replace the whole field with its default.
    #[default]
    Reject,
    /// Keep the first `max_items` elements; too-short lists are still rejected.
    Truncate,
}

/// Outcome of a cardinality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Within,
    TooFew,
    TooMany,
}

/// Clamp `value` into `[min, max]`. Returns the clamped value and whether it changed.
///
/// Either bound may be open (`None`).
pub fn clamp_number(value: f64, min: Option<f64>, max: Option<f64>) -> (f64, bool) {
    if let Some(lo) = min {
        if value < lo {
            return (lo, true);
        }
    }
    if let Some(hi) = max {
        if value > hi {
            return (hi, true);
        }
    }
    (value, false)
}

/// True when `value` lies within `[min, max]`.
pub fn in_range(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.map_or(true, |lo| value >= lo) && max.map_or(true, |hi| value <= hi)
}

/// Truncate `s` to at most `max_chars` characters.
///
/// Returns `None` when no truncation was needed. Counts `char`s, so the cut
/// always lands on a character boundary.
pub fn truncate_text(s: &str, max_chars: usize) -> Option<String> {
    s.char_indices()
        .nth(max_chars)
        .map(|(byte_idx, _)| s[..byte_idx].to_string())
}

/// Check a collection length against optional bounds.
pub fn check_cardinality(len: usize, min: Option<usize>, max: Option<usize>) -> Cardinality {
    if min.is_some_and(|lo| len < lo) {
        Cardinality::TooFew
    } else if max.is_some_and(|hi| len > hi) {
        Cardinality::TooMany
    } else {
        Cardinality::Within
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_number(150.0, Some(0.0), Some(100.0)), (100.0, true));
        assert_eq!(clamp_number(-20.0, Some(0.0), Some(100.0)), (0.0, true));
        assert_eq!(clamp_number(42.5, Some(0.0), Some(100.0)), (42.5, false));
    }

    #[test]
    fn test_clamp_open_bounds() {
        assert_eq!(clamp_number(-5.0, None, Some(10.0)), (-5.0, false));
        assert_eq!(clamp_number(1e9, Some(0.0), None), (1e9, false));
    }

    #[test]
    fn test_in_range_inclusive() {
        assert!(in_range(0.0, Some(0.0), Some(1.0)));
        assert!(in_range(1.0, Some(0.0), Some(1.0)));
        assert!(!in_range(-0.1, Some(0.0), None));
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate_text("hello", 10), None);
        assert_eq!(truncate_text("hello", 5), None);
        assert_eq!(truncate_text("hello", 3), Some("hel".to_string()));
        assert_eq!(truncate_text("日本語です", 2), Some("日本".to_string()));
        assert_eq!(truncate_text("abc", 0), Some(String::new()));
    }

    #[test]
    fn test_cardinality() {
        assert_eq!(check_cardinality(1, Some(2), Some(12)), Cardinality::TooFew);
        assert_eq!(check_cardinality(2, Some(2), Some(12)), Cardinality::Within);
        assert_eq!(check_cardinality(12, Some(2), Some(12)), Cardinality::Within);
        assert_eq!(check_cardinality(13, Some(2), Some(12)), Cardinality::TooMany);
        assert_eq!(check_cardinality(0, None, None), Cardinality::Within);
    }
}
