//! Dataset aggregation: joins field reports and external signals into
//! capability predicates.

mod aggregator;
mod predicates;

pub use aggregator::{
    Aggregation, DatasetAggregator, EvaluationOptions, EvaluationWarning, WarningSource,
    DEFAULT_STORE_TIMEOUT,
};
pub use predicates::{fold, AggregationConfig, DatasetPredicates, ExternalSignals};
