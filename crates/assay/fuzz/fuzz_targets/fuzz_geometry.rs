//! Fuzz target for geometry recognition and parsing.
//!
//! Checks that WKT/EWKT and GeoJSON handling:
//! 1. Never panics on malformed text
//! 2. Never accepts a value that fails the structural checks

#![no_main]

use assay::dictionary::DictionaryCatalog;
use assay::geometry::{check_structure, parse_value};
use assay::inference::looks_like_geometry;
use assay::RawValue;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let _ = looks_like_geometry(text, DictionaryCatalog::builtin());

    if let Ok(geometry) = parse_value(&RawValue::text(text)) {
        assert!(check_structure(&geometry).is_ok());
    }

    if let Ok(doc) = serde_json::from_str::<serde_json::Value>(text) {
        let _ = parse_value(&RawValue::Document(doc));
    }
});
