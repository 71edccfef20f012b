//! Whole-token matching over address text.

use std::collections::HashSet;

/// Characters that separate tokens besides whitespace. Hyphens stay inside
/// tokens so "р-н" is one token.
const SEPARATORS: &[char] = &[
    '.', ',', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '"', '\'', '«', '»', '/', '\\',
    '№',
];

/// Case-fold a token the way dictionary comparisons expect: lowercase with
/// "ё" folded to "е".
pub fn fold(token: &str) -> String {
    token
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'ё' { 'е' } else { c })
        .collect()
}

/// Split text into folded tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
        .map(|t| t.trim_matches('-'))
        .filter(|t| !t.is_empty())
        .map(fold)
        .collect()
}

/// Whitespace-separated word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// A set of dictionary entries matched against token sequences.
///
/// Single-word entries are matched as whole tokens; multi-word entries
/// ("поселок городского типа") as consecutive token runs.
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    words: HashSet<String>,
    phrases: Vec<Vec<String>>,
}

impl TokenSet {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = TokenSet::default();
        for entry in entries {
            let entry = entry.as_ref().trim();
            let mut tokens = tokenize(entry);
            match tokens.len() {
                0 => continue,
                1 => {
                    set.words.extend(tokens.pop());
                }
                _ => set.phrases.push(tokens),
            }
        }
        // Longest phrases first so stripping removes the widest match.
        set.phrases.sort_by(|a, b| b.len().cmp(&a.len()));
        set
    }

    /// Length of the entry matching at `tokens[start..]`, if any.
    fn match_at(&self, tokens: &[String], start: usize) -> Option<usize> {
        let rest = &tokens[start..];
        for phrase in &self.phrases {
            if rest.len() >= phrase.len() && rest[..phrase.len()] == phrase[..] {
                return Some(phrase.len());
            }
        }
        rest.first()
            .filter(|t| self.words.contains(t.as_str()))
            .map(|_| 1)
    }

    /// Returns true if any entry occurs in `tokens`.
    pub fn matches(&self, tokens: &[String]) -> bool {
        (0..tokens.len()).any(|i| self.match_at(tokens, i).is_some())
    }

    /// Number of non-overlapping entry occurrences in `tokens`.
    pub fn count(&self, tokens: &[String]) -> usize {
        let mut count = 0;
        let mut i = 0;
        while i < tokens.len() {
            match self.match_at(tokens, i) {
                Some(len) => {
                    count += 1;
                    i += len;
                }
                None => i += 1,
            }
        }
        count
    }

    /// Remove every occurrence of an entry from `tokens`.
    pub fn strip(&self, tokens: &[String]) -> Vec<String> {
        let mut kept = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            match self.match_at(tokens, i) {
                Some(len) => i += len,
                None => {
                    kept.push(tokens[i].clone());
                    i += 1;
                }
            }
        }
        kept
    }
}
