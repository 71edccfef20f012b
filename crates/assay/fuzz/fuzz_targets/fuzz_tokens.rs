//! Fuzz target for address tokenization and dictionary matching.

#![no_main]

use assay::dictionary::{tokenize, DictionaryCatalog};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let tokens = tokenize(text);
    let words = DictionaryCatalog::builtin().address_tokens();

    let count = words.count(&tokens);
    assert!(count <= tokens.len());
    assert_eq!(count > 0, words.matches(&tokens));
    assert!(words.strip(&tokens).len() <= tokens.len());
});
