//! Per-field quality metrics over a sample.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::geometry::{parse_value, Extent};
use crate::input::{FieldSample, RawValue};
use crate::schema::{FieldDescriptor, FieldMetrics, FieldType};

// =============================================================================
// LAZY STATIC PATTERNS
// =============================================================================

static INTEGER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").unwrap());

static FLOAT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").unwrap());

static DECIMAL_COMMA_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(,\d*)?|,\d+)$").unwrap());

/// Metric calculation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// `chrono` formats accepted for date fields, besides RFC 3339.
    pub date_formats: Vec<String>,
    /// Accept `,` as the decimal separator in float text.
    pub decimal_comma: bool,
    /// Territory that adequate geometries must fall within.
    pub extent: Extent,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            date_formats: [
                "%Y-%m-%d",
                "%d.%m.%Y",
                "%d/%m/%Y",
                "%Y-%m-%d %H:%M:%S",
                "%Y-%m-%dT%H:%M:%S",
                "%d.%m.%Y %H:%M:%S",
                "%d.%m.%Y %H:%M",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            decimal_comma: true,
            extent: Extent::russia(),
        }
    }
}

/// Validity of a geometry-bearing sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryQuality {
    /// Structurally valid values over non-empty values.
    pub validness: Option<f64>,
    /// Valid values inside the extent over valid values.
    pub adequacy: Option<f64>,
}

/// Count-based diversity of a sample: `(distinct - 1) / (non_empty - 1)`.
///
/// `None` for an empty sample, `0` for a single value.
pub fn entropy(non_empty: usize, distinct: usize) -> Option<f64> {
    match non_empty {
        0 => None,
        1 => Some(0.0),
        n => Some(distinct.saturating_sub(1) as f64 / (n - 1) as f64),
    }
}

fn ratio(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64)
}

/// Computes [`FieldMetrics`] for a field sample.
pub struct MetricCalculator {
    config: MetricsConfig,
}

impl MetricCalculator {
    pub fn new() -> Self {
        Self {
            config: MetricsConfig::default(),
        }
    }

    pub fn with_config(config: MetricsConfig) -> Self {
        Self { config }
    }

    /// Compute metrics for `sample`. Returns `None` for an empty sample.
    pub fn compute(&self, descriptor: &FieldDescriptor, sample: &FieldSample) -> Option<FieldMetrics> {
        if sample.is_empty() {
            return None;
        }

        let non_empty: Vec<&RawValue> = sample.non_empty().collect();
        let distinct: HashSet<_> = non_empty.iter().map(|v| v.canonical()).collect();

        let type_matching = match descriptor.field_type {
            FieldType::Unknown => None,
            ty => ratio(
                non_empty.iter().filter(|v| self.conforms(ty, v)).count(),
                non_empty.len(),
            ),
        };

        let (validness, adequacy) = if descriptor.field_type == FieldType::Geometry {
            let quality = self.geometry_quality(&non_empty);
            (quality.validness, quality.adequacy)
        } else {
            (None, None)
        };

        Some(FieldMetrics {
            type_matching,
            fullness: non_empty.len() as f64 / sample.len() as f64,
            entropy: entropy(non_empty.len(), distinct.len()),
            indexed: descriptor.indexed,
            validness,
            adequacy,
            total_count: sample.len(),
            non_empty_count: non_empty.len(),
            distinct_count: distinct.len(),
        })
    }

    /// Structural validity and extent adequacy of geometry values.
    pub fn geometry_quality(&self, values: &[&RawValue]) -> GeometryQuality {
        let mut valid = 0;
        let mut inside = 0;
        for value in values {
            if let Ok(geometry) = parse_value(value) {
                valid += 1;
                if self.config.extent.contains(&geometry) {
                    inside += 1;
                }
            }
        }

        GeometryQuality {
            validness: ratio(valid, values.len()),
            adequacy: ratio(inside, valid),
        }
    }

    /// Returns true if `value` conforms to the grammar of `field_type`.
    pub fn conforms(&self, field_type: FieldType, value: &RawValue) -> bool {
        match field_type {
            FieldType::String => matches!(value, RawValue::Text(_)),
            FieldType::Integer => match value {
                RawValue::Integer(_) => true,
                RawValue::Text(s) => INTEGER_PATTERN.is_match(s.trim()),
                _ => false,
            },
            FieldType::Float => match value {
                RawValue::Integer(_) => true,
                RawValue::Float(f) => f.is_finite(),
                RawValue::Text(s) => self.is_float_text(s.trim()),
                _ => false,
            },
            FieldType::Date => match value {
                RawValue::Text(s) => self.is_date_text(s.trim()),
                RawValue::Document(doc) => doc.get("$date").is_some(),
                _ => false,
            },
            FieldType::Geometry => parse_value(value).is_ok(),
            FieldType::Unknown => false,
        }
    }

    fn is_float_text(&self, text: &str) -> bool {
        FLOAT_PATTERN.is_match(text)
            || (self.config.decimal_comma && DECIMAL_COMMA_PATTERN.is_match(text))
    }

    fn is_date_text(&self, text: &str) -> bool {
        if DateTime::parse_from_rfc3339(text).is_ok() {
            return true;
        }
        self.config.date_formats.iter().any(|format| {
            NaiveDateTime::parse_from_str(text, format).is_ok()
                || NaiveDate::parse_from_str(text, format).is_ok()
        })
    }

    /// Infer a declared type for untyped text columns.
    ///
    /// Every non-blank value must conform; geometry text stays a string so
    /// it is reported as raw geometry rather than a geometry field.
    pub fn infer_type<S: AsRef<str>>(&self, values: &[S]) -> FieldType {
        let texts: Vec<RawValue> = values
            .iter()
            .map(|v| v.as_ref().trim())
            .filter(|v| !v.is_empty())
            .map(RawValue::from)
            .collect();
        if texts.is_empty() {
            return FieldType::String;
        }

        [FieldType::Integer, FieldType::Float, FieldType::Date]
            .into_iter()
            .find(|&ty| texts.iter().all(|v| self.conforms(ty, v)))
            .unwrap_or(FieldType::String)
    }
}

impl Default for MetricCalculator {
    fn default() -> Self {
        Self::new()
    }
}
