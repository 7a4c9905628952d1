#![no_main]

use libfuzzer_sys::fuzz_target;
use sidx::index::key::{escape_key, unescape_key, validate_key};

fuzz_target!(|data: &str| {
    let key = escape_key(data);
    assert!(validate_key(&key).is_ok());
    let lowered: String = data.chars().flat_map(char::to_lowercase).collect();
    assert_eq!(unescape_key(&key).ok(), Some(lowered));

    // Arbitrary keys may be rejected but never panic
    let _ = unescape_key(data);
});
