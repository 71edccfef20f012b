//! Per-field profiling results.

use serde::{Deserialize, Serialize};

use super::field::FieldDescriptor;

/// Quality metrics of one field over one sample.
///
/// Ratios lie in `[0, 1]`. `None` means the metric is not applicable to the
/// field (unknown type, non-geometry field, or no valid geometries to judge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMetrics {
    /// Share of values conforming to the declared type, over non-empty values.
    pub type_matching: Option<f64>,
    /// Share of non-empty values in the sample.
    pub fullness: f64,
    /// Count-based diversity: `(distinct - 1) / (non_empty - 1)`.
    pub entropy: Option<f64>,
    /// Copied from the descriptor.
    pub indexed: bool,
    /// Share of structurally valid geometries.
    pub validness: Option<f64>,
    /// Share of valid geometries lying inside the expected extent.
    pub adequacy: Option<f64>,
    /// Values in the sample.
    pub total_count: usize,
    /// Non-empty values in the sample.
    pub non_empty_count: usize,
    /// Distinct non-empty values.
    pub distinct_count: usize,
}

/// How a field came to be considered a geometry carrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeometryCandidate {
    /// Declared type is geometry.
    Declared,
    /// String values are mostly WKT/EWKT or GeoJSON text.
    RawText,
    /// Numeric coordinate that pairs with a sibling field.
    AxisPair { partner: String },
}

impl GeometryCandidate {
    pub fn label(&self) -> &'static str {
        match self {
            GeometryCandidate::Declared => "declared",
            GeometryCandidate::RawText => "raw text",
            GeometryCandidate::AxisPair { .. } => "axis pair",
        }
    }
}

/// Classification flags for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldClassification {
    /// Values look like unparsed address strings.
    pub is_address_feature: bool,
    /// Field is raw geometry or half of a coordinate pair.
    pub is_geometry_feature: bool,
    /// Why the field is a geometry carrier, if it is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<GeometryCandidate>,
}

/// Whether a region or municipality field effectively holds one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalitySummary {
    /// The field is dominated by one locality.
    pub single_value: bool,
    /// The dominant value, type words stripped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A field that was profiled successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredField {
    pub descriptor: FieldDescriptor,
    pub metrics: FieldMetrics,
    pub classification: FieldClassification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<LocalitySummary>,
}

/// Why a field has no metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnscoredReason {
    /// The raw value store returned no values.
    EmptySample,
    /// The raw value store failed.
    Unavailable { message: String },
    /// The raw value read did not finish in time.
    TimedOut { after_ms: u64 },
    /// The evaluation was cancelled before the read finished.
    Cancelled,
    /// The profiling worker crashed.
    WorkerFailed { message: String },
}

impl UnscoredReason {
    /// Get a human-readable label.
    pub fn label(&self) -> String {
        match self {
            UnscoredReason::EmptySample => "no values".to_string(),
            UnscoredReason::Unavailable { message } => format!("values unavailable: {}", message),
            UnscoredReason::TimedOut { after_ms } => format!("read timed out after {}ms", after_ms),
            UnscoredReason::Cancelled => "cancelled".to_string(),
            UnscoredReason::WorkerFailed { message } => format!("profiling failed: {}", message),
        }
    }
}

/// Outcome of profiling one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldReport {
    Scored(ScoredField),
    Unscored {
        descriptor: FieldDescriptor,
        reason: UnscoredReason,
    },
}

impl FieldReport {
    pub fn unscored(descriptor: FieldDescriptor, reason: UnscoredReason) -> Self {
        FieldReport::Unscored { descriptor, reason }
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        match self {
            FieldReport::Scored(scored) => &scored.descriptor,
            FieldReport::Unscored { descriptor, .. } => descriptor,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// The scored field, if metrics were computed.
    pub fn scored(&self) -> Option<&ScoredField> {
        match self {
            FieldReport::Scored(scored) => Some(scored),
            FieldReport::Unscored { .. } => None,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.scored().is_some()
    }

    pub fn reason(&self) -> Option<&UnscoredReason> {
        match self {
            FieldReport::Scored(_) => None,
            FieldReport::Unscored { reason, .. } => Some(reason),
        }
    }
}
