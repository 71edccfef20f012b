//! Single-locality detection for region and municipality fields.
//!
//! A region column in a city dataset usually repeats one value with minor
//! spelling variation ("Тверская обл", "тверская область"). Values are
//! normalized by stripping the role's type words, then either the top value
//! dominates outright (very low entropy) or near-duplicates of it are
//! clustered by edit distance.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dictionary::{tokenize, DictionaryCatalog};
use crate::input::{FieldSample, RawValue};
use crate::schema::{AddressRole, LocalitySummary};

/// Locality detection thresholds. Comparisons are exclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalityConfig {
    /// Below this entropy the most frequent value is taken as-is.
    pub top_value_entropy: f64,
    /// Below this entropy region values are clustered.
    pub region_cluster_entropy: f64,
    /// Below this entropy municipality values are clustered.
    pub municipality_cluster_entropy: f64,
    /// Minimum normalized similarity to join the top value's cluster.
    pub similarity: f64,
    /// Share of normalized values the cluster must cover.
    pub cluster_share: f64,
}

impl Default for LocalityConfig {
    fn default() -> Self {
        Self {
            top_value_entropy: 0.05,
            region_cluster_entropy: 0.5,
            municipality_cluster_entropy: 0.4,
            similarity: 0.8,
            cluster_share: 0.9,
        }
    }
}

pub struct LocalityDetector {
    config: LocalityConfig,
}

impl LocalityDetector {
    pub fn new() -> Self {
        Self {
            config: LocalityConfig::default(),
        }
    }

    pub fn with_config(config: LocalityConfig) -> Self {
        Self { config }
    }

    /// Summarize a locality field. Only region and municipality roles are
    /// considered; other roles yield `None`.
    pub fn detect(
        &self,
        role: AddressRole,
        sample: &FieldSample,
        entropy: Option<f64>,
        dictionary: &DictionaryCatalog,
    ) -> Option<LocalitySummary> {
        let cluster_entropy = match role {
            AddressRole::Region => self.config.region_cluster_entropy,
            AddressRole::Municipality => self.config.municipality_cluster_entropy,
            AddressRole::Street | AddressRole::House => return None,
        };

        let not_single = LocalitySummary {
            single_value: false,
            value: None,
        };
        let Some(entropy) = entropy else {
            return Some(not_single);
        };

        let type_words = dictionary.role_types(role);
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for value in sample.non_empty() {
            let RawValue::Text(text) = value else {
                continue;
            };
            let normalized = type_words.strip(&tokenize(text)).join(" ");
            if !normalized.is_empty() {
                *counts.entry(normalized).or_insert(0) += 1;
            }
        }

        let total: usize = counts.values().sum();
        let Some((top, top_count)) = counts
            .iter()
            .fold(None, |best: Option<(&String, usize)>, (name, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((name, count)),
            })
        else {
            return Some(not_single);
        };

        let single_value = if entropy < self.config.top_value_entropy {
            true
        } else if entropy < cluster_entropy {
            let clustered: usize = counts
                .iter()
                .filter(|(name, _)| similarity(top, name) > self.config.similarity)
                .map(|(_, &count)| count)
                .sum();
            clustered as f64 / total as f64 > self.config.cluster_share
        } else {
            false
        };

        tracing::trace!(?role, entropy, top = %top, top_count, single_value, "locality detection");

        Some(if single_value {
            LocalitySummary {
                single_value: true,
                value: Some(top.clone()),
            }
        } else {
            not_single
        })
    }
}

impl Default for LocalityDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Levenshtein distance over characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// `1 - distance / longer length`, in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}
