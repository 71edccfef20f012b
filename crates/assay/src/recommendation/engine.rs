//! Decision table from dataset predicates to offered operations.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::operation::Operation;
use crate::aggregate::DatasetPredicates;

/// Offered flag of every operation, in [`Operation::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationSet {
    operations: IndexMap<Operation, bool>,
}

impl RecommendationSet {
    pub fn is_offered(&self, operation: Operation) -> bool {
        self.operations.get(&operation).copied().unwrap_or(false)
    }

    /// Offered operations, in display order.
    pub fn offered(&self) -> impl Iterator<Item = Operation> + '_ {
        self.operations
            .iter()
            .filter(|(_, offered)| **offered)
            .map(|(op, _)| *op)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Operation, bool)> + '_ {
        self.operations.iter().map(|(op, offered)| (*op, *offered))
    }
}

/// Maps predicates to recommendations. Stateless and total.
pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn recommend(predicates: &DatasetPredicates) -> RecommendationSet {
        RecommendationSet {
            operations: Operation::ALL
                .iter()
                .map(|op| (*op, op.offered_when(predicates)))
                .collect(),
        }
    }
}
