//! Field descriptors and per-field profiling results.

mod field;
mod report;
mod types;

pub use field::FieldDescriptor;
pub use report::{
    FieldClassification, FieldMetrics, FieldReport, GeometryCandidate, LocalitySummary,
    ScoredField, UnscoredReason,
};
pub use types::{AddressRole, FieldType};
