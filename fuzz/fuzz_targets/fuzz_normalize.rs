#![no_main]

use libfuzzer_sys::fuzz_target;
use llm_normalize_core::{contracts, normalize, normalize_text};

// Accepts arbitrary bytes as producer text and runs the full pipeline against
// every built-in contract. Goal: no panics, and the record is a fixed point.
fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    for name in contracts::NAMES {
        let Some(spec) = contracts::by_name(name) else {
            continue;
        };
        let outcome = normalize_text(&text, spec);
        let again = normalize(&outcome.record.to_value(), spec);
        assert_eq!(again.record, outcome.record);
    }
});
