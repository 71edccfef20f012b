//! Main Assay struct and public API.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::aggregate::{
    Aggregation, AggregationConfig, DatasetAggregator, DatasetPredicates, EvaluationOptions,
    EvaluationWarning,
};
use crate::cache::{FieldCache, InFlight};
use crate::dictionary::DictionaryCatalog;
use crate::error::{AssayError, CannotEvaluate, Result};
use crate::inference::{ClassifierConfig, FieldProfiler, LocalityConfig, MetricsConfig};
use crate::input::SamplingConfig;
use crate::recommendation::{RecommendationEngine, RecommendationSet};
use crate::schema::FieldReport;
use crate::store::Stores;

/// Runtime limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Bound on each external read, in milliseconds.
    pub store_timeout_ms: u64,
    /// Maximum cached field reports (0 disables the cache).
    pub cache_capacity: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: 30_000,
            cache_capacity: 10_000,
        }
    }
}

impl RuntimeConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

/// Configuration for Assay evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssayConfig {
    pub sampling: SamplingConfig,
    pub metrics: MetricsConfig,
    pub classifier: ClassifierConfig,
    pub locality: LocalityConfig,
    pub aggregation: AggregationConfig,
    pub runtime: RuntimeConfig,
}

impl AssayConfig {
    /// Load a JSON configuration file. Missing sections keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| AssayError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AssayConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every share and threshold lies in `[0, 1]` and that the
    /// sample bound and store timeout are positive.
    pub fn validate(&self) -> Result<()> {
        let unit = [
            ("classifier.address_share", self.classifier.address_share),
            ("classifier.geometry_text_share", self.classifier.geometry_text_share),
            ("aggregation.address_min_fullness", self.aggregation.address_min_fullness),
            ("aggregation.geometry_min_fullness", self.aggregation.geometry_min_fullness),
            ("aggregation.geometry_min_validness", self.aggregation.geometry_min_validness),
            ("aggregation.geometry_min_adequacy", self.aggregation.geometry_min_adequacy),
            ("aggregation.linkage_min_ratio", self.aggregation.linkage_min_ratio),
            ("aggregation.enrichment_min_fullness", self.aggregation.enrichment_min_fullness),
            ("locality.similarity", self.locality.similarity),
            ("locality.cluster_share", self.locality.cluster_share),
            ("locality.top_value_entropy", self.locality.top_value_entropy),
            ("locality.region_cluster_entropy", self.locality.region_cluster_entropy),
            (
                "locality.municipality_cluster_entropy",
                self.locality.municipality_cluster_entropy,
            ),
        ];
        let optional = self
            .classifier
            .min_axis_entropy
            .map(|v| ("classifier.min_axis_entropy", v));
        if let Some((name, value)) = unit
            .iter()
            .copied()
            .chain(optional)
            .find(|(_, v)| !(0.0..=1.0).contains(v))
        {
            return Err(AssayError::Config(format!(
                "{} must be within [0, 1], got {}",
                name, value
            )));
        }
        if self.sampling.max_values == Some(0) {
            return Err(AssayError::Config(
                "sampling.max_values must be positive".to_string(),
            ));
        }
        if self.runtime.store_timeout_ms == 0 {
            return Err(AssayError::Config(
                "runtime.store_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of evaluating one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub dataset_id: String,
    pub evaluated_at: DateTime<Utc>,
    pub predicates: DatasetPredicates,
    pub recommendations: RecommendationSet,
    /// One report per field, in descriptor order.
    pub fields: Vec<FieldReport>,
    pub warnings: Vec<EvaluationWarning>,
}

impl From<Aggregation> for Evaluation {
    fn from(aggregation: Aggregation) -> Self {
        Self {
            recommendations: RecommendationEngine::recommend(&aggregation.predicates),
            dataset_id: aggregation.dataset_id,
            evaluated_at: Utc::now(),
            predicates: aggregation.predicates,
            fields: aggregation.fields,
            warnings: aggregation.warnings,
        }
    }
}

type Shared = std::result::Result<Evaluation, CannotEvaluate>;

/// The main Assay evaluation engine.
pub struct Assay {
    aggregator: DatasetAggregator,
    in_flight: InFlight<String, Shared>,
}

impl Assay {
    /// Create an Assay over `stores` with default configuration.
    pub fn new(stores: Stores) -> Result<Self> {
        Self::with_config(stores, AssayConfig::default())
    }

    /// Create an Assay with custom configuration and the built-in dictionary.
    pub fn with_config(stores: Stores, config: AssayConfig) -> Result<Self> {
        Self::with_dictionary(stores, config, Arc::new(DictionaryCatalog::builtin().clone()))
    }

    pub fn with_dictionary(
        stores: Stores,
        config: AssayConfig,
        dictionary: Arc<DictionaryCatalog>,
    ) -> Result<Self> {
        config.validate()?;
        let profiler = FieldProfiler::with_config(
            dictionary,
            config.metrics.clone(),
            config.classifier.clone(),
            config.locality.clone(),
        )?;
        Self::with_profiler(stores, config, profiler)
    }

    /// Create an Assay around a prepared profiler, e.g. one with a custom
    /// axis pairing.
    pub fn with_profiler(
        stores: Stores,
        config: AssayConfig,
        profiler: FieldProfiler,
    ) -> Result<Self> {
        config.validate()?;
        let mut aggregator = DatasetAggregator::new(
            stores,
            Arc::new(profiler),
            config.sampling,
            config.aggregation,
        )
        .with_store_timeout(config.runtime.store_timeout());
        if config.runtime.cache_capacity > 0 {
            aggregator = aggregator.with_cache(FieldCache::new(config.runtime.cache_capacity));
        }

        Ok(Self {
            aggregator,
            in_flight: InFlight::new(),
        })
    }

    /// Field reports and predicates without recommendations.
    pub async fn aggregate(&self, dataset_id: &str) -> Result<Aggregation> {
        Ok(self
            .aggregator
            .aggregate(dataset_id, &EvaluationOptions::default())
            .await?)
    }

    /// Evaluate a dataset with default options.
    pub async fn evaluate(&self, dataset_id: &str) -> Result<Evaluation> {
        self.evaluate_with(dataset_id, &EvaluationOptions::default())
            .await
    }

    /// Evaluate a dataset.
    ///
    /// Concurrent calls for the same dataset share one evaluation and run
    /// under the options of the call that started it.
    pub async fn evaluate_with(
        &self,
        dataset_id: &str,
        options: &EvaluationOptions,
    ) -> Result<Evaluation> {
        let outcome = self
            .in_flight
            .run(dataset_id.to_string(), || async {
                let aggregation = self.aggregator.aggregate(dataset_id, options).await?;
                let evaluation = Evaluation::from(aggregation);
                tracing::info!(
                    dataset = %dataset_id,
                    offered = ?evaluation.recommendations.offered().map(|op| op.label()).collect::<Vec<_>>(),
                    "dataset evaluated"
                );
                Ok::<_, CannotEvaluate>(evaluation)
            })
            .await;

        outcome.map_err(|err| {
            tracing::warn!(dataset = %dataset_id, reason = %err.reason, "cannot evaluate");
            AssayError::from(err)
        })
    }

    /// Evaluate several datasets concurrently. Results keep input order.
    pub async fn evaluate_many<I, S>(&self, dataset_ids: I) -> Vec<(String, Result<Evaluation>)>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = dataset_ids.into_iter().map(Into::into).collect();
        let results = join_all(ids.iter().map(|id| self.evaluate(id))).await;
        ids.into_iter().zip(results).collect()
    }

    /// Forget cached field reports of a dataset, and whatever the value
    /// store keeps for it.
    pub fn invalidate(&self, dataset_id: &str) {
        self.aggregator.invalidate(dataset_id);
    }

    /// Run the decision table alone.
    pub fn recommend(predicates: &DatasetPredicates) -> RecommendationSet {
        RecommendationEngine::recommend(predicates)
    }
}
