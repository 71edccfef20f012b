//! Capability recommendations.

mod engine;
mod operation;

pub use engine::{RecommendationEngine, RecommendationSet};
pub use operation::Operation;
