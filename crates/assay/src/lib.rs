//! Assay: field profiling and capability recommendation for tabular datasets.
//!
//! Assay reads a dataset's field descriptors and raw values through pluggable
//! stores, scores every field (type matching, fullness, entropy, geometry
//! validness and adequacy), classifies fields as address or geometry
//! features, folds the results into dataset predicates and maps those onto
//! the data-enrichment operations worth offering.
//!
//! # Core Principles
//!
//! - **Degrade, don't fail**: a missing value sample leaves one field
//!   unscored; a failed external service only clears its predicate
//! - **Deterministic**: the same descriptors, values and signals always give
//!   the same recommendations
//! - **Read-only**: stores are never written to
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use assay::{Assay, DirectoryStore, Stores};
//!
//! # async fn run() -> assay::Result<()> {
//! let store = Arc::new(DirectoryStore::new("datasets"));
//! let assay = Assay::new(Stores::shared(store))?;
//! let evaluation = assay.evaluate("buildings").await?;
//!
//! for op in evaluation.recommendations.offered() {
//!     println!("{}", op);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod cache;
pub mod dictionary;
pub mod error;
pub mod geometry;
pub mod inference;
pub mod input;
pub mod recommendation;
pub mod schema;
pub mod store;

mod assay;

pub use crate::assay::{Assay, AssayConfig, Evaluation, RuntimeConfig};
pub use aggregate::{
    Aggregation, AggregationConfig, DatasetPredicates, EvaluationOptions, EvaluationWarning,
    WarningSource,
};
pub use dictionary::DictionaryCatalog;
pub use error::{AssayError, CannotEvaluate, Result};
pub use input::RawValue;
pub use recommendation::{Operation, RecommendationEngine, RecommendationSet};
pub use schema::{AddressRole, FieldDescriptor, FieldMetrics, FieldReport, FieldType};
pub use store::{CatalogEntry, DirectoryStore, MemoryDataset, MemoryStore, Stores};
