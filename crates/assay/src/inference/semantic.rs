//! Field classification: unparsed addresses and geometry carriers.

use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dictionary::{tokenize, word_count, DictionaryCatalog};
use crate::error::Result;
use crate::geometry::strip_srid;
use crate::input::{FieldSample, RawValue};
use crate::schema::{FieldClassification, FieldDescriptor, FieldMetrics, FieldType, GeometryCandidate};

/// Classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Minimum whitespace-separated words in an address-like value.
    pub min_address_words: usize,
    /// Minimum dictionary words in an address-like value.
    pub min_dictionary_matches: usize,
    /// Share of address-like values needed, exclusive.
    pub address_share: f64,
    /// Share of geometry-like text values needed, exclusive.
    pub geometry_text_share: f64,
    /// Field-name pattern of longitude / x coordinates.
    pub x_axis_pattern: String,
    /// Field-name pattern of latitude / y coordinates.
    pub y_axis_pattern: String,
    /// Minimum entropy for a coordinate field, exclusive.
    pub min_axis_entropy: Option<f64>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_address_words: 3,
            min_dictionary_matches: 1,
            address_share: 0.5,
            geometry_text_share: 0.5,
            x_axis_pattern: r"(?i)(^|[_\s.-])(x|lon|lng|long|longitude|долгота)$".to_string(),
            y_axis_pattern: r"(?i)(^|[_\s.-])(y|lat|latitude|широта)$".to_string(),
            min_axis_entropy: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn other(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// Decides whether a numeric field is one half of a coordinate pair.
pub trait AxisPairing: Send + Sync {
    /// Name of the sibling completing the pair with `field`, if any.
    fn partner(&self, field: &FieldDescriptor, siblings: &[FieldDescriptor]) -> Option<String>;
}

/// Pairs fields by name: `x`/`y`, `lon`/`lat`, `coord_x`/`coord_y` and so on.
/// Siblings sharing the same name stem are preferred.
pub struct NamePatternPairing {
    x: Regex,
    y: Regex,
}

impl NamePatternPairing {
    pub fn new(x_pattern: &str, y_pattern: &str) -> Result<Self> {
        Ok(Self {
            x: Regex::new(x_pattern)?,
            y: Regex::new(y_pattern)?,
        })
    }

    fn pattern(&self, axis: Axis) -> &Regex {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    fn axis(&self, name: &str) -> Option<Axis> {
        if self.x.is_match(name) {
            Some(Axis::X)
        } else if self.y.is_match(name) {
            Some(Axis::Y)
        } else {
            None
        }
    }

    fn stem(&self, name: &str, axis: Axis) -> String {
        self.pattern(axis).replace(name, "").to_lowercase()
    }
}

impl AxisPairing for NamePatternPairing {
    fn partner(&self, field: &FieldDescriptor, siblings: &[FieldDescriptor]) -> Option<String> {
        if !field.field_type.is_numeric() {
            return None;
        }
        let axis = self.axis(&field.name)?;
        let wanted = axis.other();
        let stem = self.stem(&field.name, axis);

        let mut fallback = None;
        for sibling in siblings {
            if sibling.name == field.name
                || !sibling.field_type.is_numeric()
                || self.axis(&sibling.name) != Some(wanted)
            {
                continue;
            }
            if self.stem(&sibling.name, wanted) == stem {
                return Some(sibling.name.clone());
            }
            fallback.get_or_insert_with(|| sibling.name.clone());
        }
        fallback
    }
}

/// Classifies fields as address features or geometry features.
pub struct FieldClassifier {
    config: ClassifierConfig,
    pairing: Arc<dyn AxisPairing>,
}

impl FieldClassifier {
    /// Create a classifier with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(ClassifierConfig::default())
    }

    /// Create a classifier pairing axes by the configured name patterns.
    pub fn with_config(config: ClassifierConfig) -> Result<Self> {
        let pairing = NamePatternPairing::new(&config.x_axis_pattern, &config.y_axis_pattern)?;
        Ok(Self {
            config,
            pairing: Arc::new(pairing),
        })
    }

    /// Replace the coordinate pairing strategy.
    pub fn with_pairing(mut self, pairing: Arc<dyn AxisPairing>) -> Self {
        self.pairing = pairing;
        self
    }

    pub fn classify(
        &self,
        descriptor: &FieldDescriptor,
        sample: &FieldSample,
        metrics: &FieldMetrics,
        siblings: &[FieldDescriptor],
        dictionary: &DictionaryCatalog,
    ) -> FieldClassification {
        let mut classification = FieldClassification::default();

        match descriptor.field_type {
            FieldType::String => {
                classification.is_address_feature = self.is_address_feature(sample, dictionary);
                if self.is_geometry_text(sample, dictionary) {
                    classification.is_geometry_feature = true;
                    classification.geometry = Some(GeometryCandidate::RawText);
                }
            }
            FieldType::Geometry => {
                classification.geometry = Some(GeometryCandidate::Declared);
            }
            FieldType::Integer | FieldType::Float => {
                let diverse = match (self.config.min_axis_entropy, metrics.entropy) {
                    (None, _) => true,
                    (Some(min), Some(entropy)) => entropy > min,
                    (Some(_), None) => false,
                };
                if diverse {
                    if let Some(partner) = self.pairing.partner(descriptor, siblings) {
                        classification.is_geometry_feature = true;
                        classification.geometry = Some(GeometryCandidate::AxisPair { partner });
                    }
                }
            }
            FieldType::Date | FieldType::Unknown => {}
        }

        classification
    }

    /// More than `address_share` of non-empty text values have enough words
    /// and dictionary hits.
    fn is_address_feature(&self, sample: &FieldSample, dictionary: &DictionaryCatalog) -> bool {
        let words = dictionary.address_tokens();
        self.share_exceeds(sample, self.config.address_share, |text| {
            word_count(text) >= self.config.min_address_words
                && words.count(&tokenize(text)) >= self.config.min_dictionary_matches.max(1)
        })
    }

    fn is_geometry_text(&self, sample: &FieldSample, dictionary: &DictionaryCatalog) -> bool {
        self.share_exceeds(sample, self.config.geometry_text_share, |text| {
            looks_like_geometry(text, dictionary)
        })
    }

    fn share_exceeds(&self, sample: &FieldSample, share: f64, test: impl Fn(&str) -> bool) -> bool {
        let mut total = 0usize;
        let mut hits = 0usize;
        for value in sample.non_empty() {
            total += 1;
            if let RawValue::Text(text) = value {
                if test(text) {
                    hits += 1;
                }
            }
        }
        total > 0 && hits as f64 / total as f64 > share
    }
}

/// Returns true if `text` opens like WKT/EWKT or is a GeoJSON object of a
/// recognized type.
pub fn looks_like_geometry(text: &str, dictionary: &DictionaryCatalog) -> bool {
    let text = strip_srid(text).trim();

    if text.starts_with('{') {
        let Ok(doc) = serde_json::from_str::<serde_json::Value>(text) else {
            return false;
        };
        return doc
            .get("type")
            .and_then(|t| t.as_str())
            .is_some_and(|t| t == "Feature" || dictionary.is_geometry_type(t));
    }

    let Some(name) = dictionary.geometry_type_prefix(text) else {
        return false;
    };
    let mut rest = text[name.len()..].trim_start();
    for dimension in ["ZM", "Z", "M"] {
        if let Some(head) = rest.get(..dimension.len()) {
            let boundary = rest[dimension.len()..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric());
            if head.eq_ignore_ascii_case(dimension) && boundary {
                rest = &rest[dimension.len()..];
                break;
            }
        }
    }
    let rest = rest.trim_start();
    rest.is_empty()
        || rest.starts_with('(')
        || rest.get(..5).is_some_and(|h| h.eq_ignore_ascii_case("EMPTY"))
}
