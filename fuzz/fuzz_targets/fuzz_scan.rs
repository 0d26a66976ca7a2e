#![no_main]

use libfuzzer_sys::fuzz_target;
use llm_normalize_core::scan_partial_field;

// Every prefix of the buffer must scan without panicking, and the live text
// must only ever grow as the buffer does.
fuzz_target!(|data: &[u8]| {
    let Ok(buffer) = std::str::from_utf8(data) else {
        return;
    };
    let mut previous = String::new();
    for end in (0..=buffer.len()).filter(|&i| buffer.is_char_boundary(i)) {
        let live = scan_partial_field(&buffer[..end], "response");
        assert!(live.starts_with(&previous));
        previous = live;
    }
});
