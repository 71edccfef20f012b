//! Dictionary catalog: address type words and geometry type names.

mod catalog;
mod tokens;

pub use catalog::{DictionaryCatalog, DictionaryLists};
pub use tokens::{fold, tokenize, word_count, TokenSet};
