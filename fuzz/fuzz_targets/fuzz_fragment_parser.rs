#![no_main]

use libfuzzer_sys::fuzz_target;
use sidx::index::{parser, writer, SearchIndex};

fuzz_target!(|data: &str| {
    // Must not panic; anything that parses must survive a write/parse cycle
    let _ = parser::parse_value(data);
    if let Ok(index) = SearchIndex::parse(data) {
        let _ = index.lookup(data);
        for entry in &index.entries {
            for record in &entry.records {
                let _ = record.owning_file();
            }
        }
        let written = writer::to_js(&index);
        let reparsed = SearchIndex::parse(&written).expect("writer output parses");
        assert_eq!(reparsed, index);
    }
});
