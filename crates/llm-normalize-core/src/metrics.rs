//! Derived metrics computed from normalized records.

use std::collections::BTreeMap;

/// Count `items` per category.
///
/// Every category in `categories` is present in the result, including those
/// with zero items. Items outside the category set are ignored; feed
/// canonicalized values to avoid losing any.
pub fn count_by_category<'a, I, C>(items: I, categories: &[C]) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a str>,
    C: AsRef<str>,
{
    let mut counts: BTreeMap<String, usize> = categories
        .iter()
        .map(|c| (c.as_ref().to_string(), 0))
        .collect();

    for item in items {
        match counts.get_mut(item) {
            Some(count) => *count += 1,
            None => tracing::debug!(item, "item outside the category set; not counted"),
        }
    }

    counts
}

/// Percentage of `expected` items actually found, rounded and clamped to `0..=100`.
///
/// `confidence = round(100 * actual / max(expected, 1))`. The `max(expected, 1)`
/// floor is deliberate: with nothing expected the ratio is undefined, and the
/// floor maps it deterministically to 100 (`confidence(0, 0) == 100`) rather
/// than to a division by zero. Halves round up.
pub fn confidence(actual: usize, expected: usize) -> u8 {
    if expected == 0 {
        return 100;
    }
    let actual = actual as u128;
    let expected = expected as u128;
    // round(100a / e) == floor((200a + e) / 2e)
    let pct = (200 * actual + expected) / (2 * expected);
    pct.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEVERITIES: [&str; 4] = ["critical", "major", "minor", "info"];

    #[test]
    fn test_empty_items_keep_every_category() {
        let counts = count_by_category(std::iter::empty(), &SEVERITIES);
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&n| n == 0));
    }

    #[test]
    fn test_counts() {
        let counts = count_by_category(["major", "minor", "major", "bogus"], &SEVERITIES);
        assert_eq!(counts["major"], 2);
        assert_eq!(counts["minor"], 1);
        assert_eq!(counts["critical"], 0);
        assert_eq!(counts["info"], 0);
        assert!(!counts.contains_key("bogus"));
    }

    #[test]
    fn test_confidence() {
        assert_eq!(confidence(0, 0), 100);
        assert_eq!(confidence(5, 3), 100);
        assert_eq!(confidence(1, 3), 33);
        assert_eq!(confidence(2, 3), 67);
        assert_eq!(confidence(1, 2), 50);
        assert_eq!(confidence(0, 7), 0);
        assert_eq!(confidence(1, 8), 13); // 12.5 rounds up
        assert_eq!(confidence(usize::MAX, usize::MAX), 100);
    }
}
