//! Fuzz target for the delimited file parser.
//!
//! Checks that delimiter detection and parsing never panic and that every
//! parsed column has one cell per row.

#![no_main]

use assay::input::{Parser, ParserConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let parser = Parser::with_config(ParserConfig::default());
    for delimiter in [b';', b',', b'\t'] {
        if let Ok(table) = parser.parse_bytes(data, delimiter) {
            for name in table.headers() {
                if let Some(column) = table.column(name) {
                    assert_eq!(column.len(), table.row_count());
                }
            }
        }
    }
});
