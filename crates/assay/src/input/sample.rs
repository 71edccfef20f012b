//! Raw field values and bounded samples.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One stored value, as returned by a raw value store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Structured document, e.g. a GeoJSON geometry.
    Document(serde_json::Value),
}

impl RawValue {
    pub fn text(value: impl Into<String>) -> Self {
        RawValue::Text(value.into())
    }

    /// Null values and blank strings are empty.
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Canonical rendering used for distinct counting and checksums.
    pub fn canonical(&self) -> Cow<'_, str> {
        match self {
            RawValue::Null => Cow::Borrowed(""),
            RawValue::Boolean(b) => Cow::Owned(b.to_string()),
            RawValue::Integer(i) => Cow::Owned(i.to_string()),
            RawValue::Float(f) => Cow::Owned(f.to_string()),
            RawValue::Text(s) => Cow::Borrowed(s.trim()),
            RawValue::Document(doc) => Cow::Owned(doc.to_string()),
        }
    }

    fn kind_tag(&self) -> u8 {
        match self {
            RawValue::Null => 0,
            RawValue::Boolean(_) => 1,
            RawValue::Integer(_) => 2,
            RawValue::Float(_) => 3,
            RawValue::Text(_) => 4,
            RawValue::Document(_) => 5,
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

/// Sampling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Upper bound on values profiled per field (None = all).
    #[serde(alias = "max_sample_size")]
    pub max_values: Option<usize>,
    /// Text values equal to one of these (case-insensitive) count as empty.
    pub null_markers: Vec<String>,
    /// Seed for reservoir sampling. Together with the dataset and field
    /// names it fixes which values a bounded sample keeps.
    pub seed: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_values: Some(10_000),
            null_markers: ["null", "na", "n/a", "none", "nil"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            seed: 0x5eed,
        }
    }
}

/// An ordered sample of one field's values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSample {
    values: Vec<RawValue>,
}

impl FieldSample {
    pub fn new(values: Vec<RawValue>) -> Self {
        Self { values }
    }

    /// Build a sample, turning configured null markers into [`RawValue::Null`].
    pub fn normalized(values: Vec<RawValue>, null_markers: &[String]) -> Self {
        let values = values
            .into_iter()
            .map(|value| match &value {
                RawValue::Text(s)
                    if null_markers
                        .iter()
                        .any(|m| m.eq_ignore_ascii_case(s.trim())) =>
                {
                    RawValue::Null
                }
                _ => value,
            })
            .collect();
        Self { values }
    }

    /// Keep at most `limit` values by seeded reservoir sampling. Retained
    /// values keep their original relative order.
    pub fn bounded(self, limit: Option<usize>, seed: u64) -> Self {
        let Some(limit) = limit else {
            return self;
        };
        if self.values.len() <= limit {
            return self;
        }

        let mut rng = fastrand::Rng::with_seed(seed);
        let mut reservoir: Vec<usize> = (0..limit).collect();
        for index in limit..self.values.len() {
            let slot = rng.usize(..=index);
            if slot < limit {
                reservoir[slot] = index;
            }
        }
        reservoir.sort_unstable();

        let mut keep = reservoir.into_iter().peekable();
        let values = self
            .values
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| {
                if keep.peek() == Some(&i) {
                    keep.next();
                    Some(v)
                } else {
                    None
                }
            })
            .collect();
        Self { values }
    }

    pub fn values(&self) -> &[RawValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn non_empty(&self) -> impl Iterator<Item = &RawValue> {
        self.values.iter().filter(|v| !v.is_empty())
    }

    /// SHA-256 over `context` and the sample contents.
    ///
    /// Every piece is length-prefixed so distinct inputs cannot collide by
    /// concatenation.
    pub fn checksum<S: AsRef<str>>(&self, context: &[S]) -> String {
        let mut hasher = Sha256::new();
        for part in context {
            let part = part.as_ref().as_bytes();
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        hasher.update((self.values.len() as u64).to_le_bytes());
        for value in &self.values {
            let canonical = value.canonical();
            hasher.update([value.kind_tag()]);
            hasher.update((canonical.len() as u64).to_le_bytes());
            hasher.update(canonical.as_bytes());
        }
        format!("sha256:{:x}", hasher.finalize())
    }
}

/// Derive a per-field sampling seed.
pub fn field_seed(seed: u64, dataset_id: &str, field: &str) -> u64 {
    let digest = Sha256::new()
        .chain_update(seed.to_le_bytes())
        .chain_update(dataset_id.as_bytes())
        .chain_update([0])
        .chain_update(field.as_bytes())
        .finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&str]) -> Vec<RawValue> {
        values.iter().map(|v| RawValue::from(*v)).collect()
    }

    #[test]
    fn test_empty_values() {
        assert!(RawValue::Null.is_empty());
        assert!(RawValue::text("   ").is_empty());
        assert!(!RawValue::Integer(0).is_empty());
        assert!(!RawValue::text("0").is_empty());
    }

    #[test]
    fn test_untagged_deserialization() {
        let values: Vec<RawValue> =
            serde_json::from_str(r#"[null, true, 3, 2.5, "x", {"type": "Point"}]"#).unwrap();
        assert_eq!(values[0], RawValue::Null);
        assert_eq!(values[1], RawValue::Boolean(true));
        assert_eq!(values[2], RawValue::Integer(3));
        assert_eq!(values[3], RawValue::Float(2.5));
        assert_eq!(values[4], RawValue::text("x"));
        assert!(matches!(values[5], RawValue::Document(_)));
    }

    #[test]
    fn test_null_markers() {
        let markers = SamplingConfig::default().null_markers;
        let sample = FieldSample::normalized(texts(&["NULL", "n/a", "value", " None "]), &markers);
        assert_eq!(sample.non_empty().count(), 1);
        assert_eq!(sample.len(), 4);
    }

    #[test]
    fn test_bounded_is_deterministic_and_ordered() {
        let values: Vec<RawValue> = (0..1000).map(RawValue::Integer).collect();
        let a = FieldSample::new(values.clone()).bounded(Some(50), 7);
        let b = FieldSample::new(values).bounded(Some(50), 7);

        assert_eq!(a.len(), 50);
        assert_eq!(a, b);
        let ints: Vec<i64> = a
            .values()
            .iter()
            .map(|v| match v {
                RawValue::Integer(i) => *i,
                _ => unreachable!(),
            })
            .collect();
        assert!(ints.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_bounded_keeps_small_samples() {
        let sample = FieldSample::new(texts(&["a", "b"])).bounded(Some(10), 1);
        assert_eq!(sample.len(), 2);
    }

    #[test]
    fn test_checksum_depends_on_values_and_context() {
        let sample = FieldSample::new(texts(&["a", "b"]));
        let same = FieldSample::new(texts(&["a", "b"]));
        let other = FieldSample::new(texts(&["ab"]));

        assert_eq!(sample.checksum(&["string"]), same.checksum(&["string"]));
        assert_ne!(sample.checksum(&["string"]), other.checksum(&["string"]));
        assert_ne!(sample.checksum(&["string"]), sample.checksum(&["float"]));
    }

    #[test]
    fn test_field_seed_varies_by_field() {
        assert_ne!(field_seed(1, "ds", "a"), field_seed(1, "ds", "b"));
        assert_eq!(field_seed(1, "ds", "a"), field_seed(1, "ds", "a"));
    }
}
