//! Field metrics, classification and profiling.

mod fusion;
mod locality;
mod semantic;
mod statistical;

pub use fusion::FieldProfiler;
pub use locality::{levenshtein, similarity, LocalityConfig, LocalityDetector};
pub use semantic::{
    looks_like_geometry, AxisPairing, ClassifierConfig, FieldClassifier, NamePatternPairing,
};
pub use statistical::{entropy, GeometryQuality, MetricCalculator, MetricsConfig};
