//! Dataset evaluation pipeline.
//!
//! Reads field descriptors, profiles every field concurrently on blocking
//! workers, reads the linkage and catalog services alongside, then folds the
//! joined results into [`DatasetPredicates`].

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::predicates::{fold, AggregationConfig, DatasetPredicates, ExternalSignals};
use crate::cache::{FieldCache, FieldKey};
use crate::error::{CannotEvaluate, Result};
use crate::inference::FieldProfiler;
use crate::input::{field_seed, FieldSample, SamplingConfig};
use crate::schema::{FieldDescriptor, FieldReport, UnscoredReason};
use crate::store::Stores;

/// Default bound on a single external read.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-call evaluation controls.
#[derive(Debug, Clone, Default)]
pub struct EvaluationOptions {
    /// Bound on each external read. `None` uses the aggregator's default.
    pub timeout: Option<Duration>,
    /// Cancels every outstanding external read when triggered.
    pub cancel: Option<CancellationToken>,
}

impl EvaluationOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Where a degraded result came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningSource {
    Metadata,
    Field { name: String },
    Linkage,
    Catalog,
}

/// A non-fatal problem met during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationWarning {
    pub source: WarningSource,
    pub message: String,
}

impl EvaluationWarning {
    fn new(source: WarningSource, message: impl Into<String>) -> Self {
        Self {
            source,
            message: message.into(),
        }
    }
}

/// Joined field reports and folded predicates of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub dataset_id: String,
    pub fields: Vec<FieldReport>,
    pub predicates: DatasetPredicates,
    pub warnings: Vec<EvaluationWarning>,
}

/// Why a guarded external read produced no value.
#[derive(Debug, Clone)]
enum ReadFailure {
    Failed(String),
    TimedOut(Duration),
    Cancelled,
}

impl ReadFailure {
    fn into_reason(self) -> UnscoredReason {
        match self {
            ReadFailure::Failed(message) => UnscoredReason::Unavailable { message },
            ReadFailure::TimedOut(after) => UnscoredReason::TimedOut {
                after_ms: after.as_millis() as u64,
            },
            ReadFailure::Cancelled => UnscoredReason::Cancelled,
        }
    }

    fn describe(&self) -> String {
        match self {
            ReadFailure::Failed(message) => message.clone(),
            ReadFailure::TimedOut(after) => format!("timed out after {} ms", after.as_millis()),
            ReadFailure::Cancelled => "cancelled".to_string(),
        }
    }
}

/// Evaluates datasets against the configured stores.
pub struct DatasetAggregator {
    stores: Stores,
    profiler: Arc<FieldProfiler>,
    cache: Option<FieldCache>,
    sampling: SamplingConfig,
    config: AggregationConfig,
    store_timeout: Duration,
}

impl DatasetAggregator {
    pub fn new(
        stores: Stores,
        profiler: Arc<FieldProfiler>,
        sampling: SamplingConfig,
        config: AggregationConfig,
    ) -> Self {
        Self {
            stores,
            profiler,
            cache: None,
            sampling,
            config,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Reuse field reports across evaluations.
    pub fn with_cache(mut self, cache: FieldCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Forget cached field reports and store-side caches of a dataset.
    pub fn invalidate(&self, dataset_id: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate_dataset(dataset_id);
        }
        self.stores.values.invalidate(dataset_id);
    }

    /// Evaluate one dataset.
    ///
    /// Fails only when no field descriptors can be obtained. Every other
    /// failure degrades a field to unscored or a signal to absent and is
    /// reported in the warnings.
    pub async fn aggregate(
        &self,
        dataset_id: &str,
        options: &EvaluationOptions,
    ) -> std::result::Result<Aggregation, CannotEvaluate> {
        let span = tracing::info_span!("aggregate", dataset = %dataset_id);
        self.run(dataset_id, options).instrument(span).await
    }

    async fn run(
        &self,
        dataset_id: &str,
        options: &EvaluationOptions,
    ) -> std::result::Result<Aggregation, CannotEvaluate> {
        let started = Instant::now();
        let cannot = |reason: String| CannotEvaluate {
            dataset_id: dataset_id.to_string(),
            reason,
        };

        let descriptors = self
            .guarded(options, self.stores.metadata.field_descriptors(dataset_id))
            .await
            .map_err(|failure| {
                tracing::warn!(error = %failure.describe(), "metadata store read failed");
                cannot(format!("metadata store: {}", failure.describe()))
            })?;

        let (descriptors, mut warnings) = dedupe(descriptors);
        if descriptors.is_empty() {
            return Err(cannot("no field descriptors".to_string()));
        }

        let siblings: Arc<[FieldDescriptor]> = descriptors.clone().into();
        let profiles = descriptors
            .into_iter()
            .map(|descriptor| self.profile_field(dataset_id, descriptor, Arc::clone(&siblings), options));

        let (fields, linkage, catalog) = tokio::join!(
            join_all(profiles),
            self.guarded(options, self.stores.linkage.linkage_ratio(dataset_id)),
            self.guarded(options, self.stores.catalog.catalog_entry(dataset_id)),
        );

        for report in &fields {
            if let Some(reason) = report.reason() {
                if *reason != UnscoredReason::EmptySample {
                    warnings.push(EvaluationWarning::new(
                        WarningSource::Field {
                            name: report.name().to_string(),
                        },
                        reason.label(),
                    ));
                }
            }
        }

        let linkage_ratio = match linkage {
            Ok(ratio) => ratio.filter(|r| r.is_finite()).map(|r| r.clamp(0.0, 1.0)),
            Err(failure) => {
                tracing::warn!(error = %failure.describe(), "linkage service read failed");
                warnings.push(EvaluationWarning::new(WarningSource::Linkage, failure.describe()));
                None
            }
        };
        let catalog = match catalog {
            Ok(entry) => Some(entry),
            Err(failure) => {
                tracing::warn!(error = %failure.describe(), "catalog service read failed");
                warnings.push(EvaluationWarning::new(WarningSource::Catalog, failure.describe()));
                None
            }
        };

        let signals = ExternalSignals {
            linkage_ratio,
            catalog,
        };
        let predicates = fold(&fields, &signals, &self.config);

        tracing::info!(
            fields = fields.len(),
            scored = fields.iter().filter(|f| f.is_scored()).count(),
            warnings = warnings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dataset aggregated"
        );

        Ok(Aggregation {
            dataset_id: dataset_id.to_string(),
            fields,
            predicates,
            warnings,
        })
    }

    async fn profile_field(
        &self,
        dataset_id: &str,
        descriptor: FieldDescriptor,
        siblings: Arc<[FieldDescriptor]>,
        options: &EvaluationOptions,
    ) -> FieldReport {
        let limit = self.sampling.max_values;
        let read = self
            .stores
            .values
            .field_values(dataset_id, &descriptor.name, limit);
        let values = match self.guarded(options, read).await {
            Ok(values) => values,
            Err(failure) => {
                tracing::warn!(field = %descriptor.name, error = %failure.describe(), "field unscored");
                return FieldReport::unscored(descriptor, failure.into_reason());
            }
        };

        let seed = field_seed(self.sampling.seed, dataset_id, &descriptor.name);
        let sample =
            FieldSample::normalized(values, &self.sampling.null_markers).bounded(limit, seed);
        tracing::debug!(field = %descriptor.name, values = sample.len(), "profiling field");

        let key = FieldKey::new(
            dataset_id,
            descriptor.name.as_str(),
            sample.checksum(&checksum_context(&descriptor, &siblings)),
        );

        let profiler = Arc::clone(&self.profiler);
        let worker_descriptor = descriptor.clone();
        let compute = async move {
            tokio::task::spawn_blocking(move || {
                profiler.profile(&worker_descriptor, &sample, &siblings)
            })
            .await
            .map_err(|e| e.to_string())
        };

        let outcome = match &self.cache {
            Some(cache) => cache
                .get_or_compute(key, compute)
                .await
                .map_err(|e| e.to_string()),
            None => compute.await,
        };

        outcome.unwrap_or_else(|message| {
            tracing::warn!(field = %descriptor.name, error = %message, "profiling worker failed");
            FieldReport::unscored(descriptor, UnscoredReason::WorkerFailed { message })
        })
    }

    /// Bound an external read by the timeout and the cancellation token.
    async fn guarded<T>(
        &self,
        options: &EvaluationOptions,
        read: impl Future<Output = Result<T>>,
    ) -> std::result::Result<T, ReadFailure> {
        let timeout = options.timeout.unwrap_or(self.store_timeout);
        let timed = tokio::time::timeout(timeout, read);

        let outcome = match &options.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(ReadFailure::Cancelled),
                outcome = timed => outcome,
            },
            None => timed.await,
        };

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(ReadFailure::Failed(err.to_string())),
            Err(_) => Err(ReadFailure::TimedOut(timeout)),
        }
    }
}

/// Drop descriptors with blank or repeated names, keeping the first.
fn dedupe(descriptors: Vec<FieldDescriptor>) -> (Vec<FieldDescriptor>, Vec<EvaluationWarning>) {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(descriptors.len());
    let mut warnings = Vec::new();

    for descriptor in descriptors {
        if descriptor.name.trim().is_empty() {
            warnings.push(EvaluationWarning::new(
                WarningSource::Metadata,
                "skipped a field with a blank name",
            ));
        } else if !seen.insert(descriptor.name.clone()) {
            warnings.push(EvaluationWarning::new(
                WarningSource::Metadata,
                format!("skipped duplicate field '{}'", descriptor.name),
            ));
        } else {
            kept.push(descriptor);
        }
    }
    (kept, warnings)
}

/// Declared properties that change a report without changing the values.
fn checksum_context(descriptor: &FieldDescriptor, siblings: &[FieldDescriptor]) -> Vec<String> {
    let mut context = vec![
        descriptor.field_type.as_str().to_string(),
        descriptor.indexed.to_string(),
        descriptor
            .role
            .map(|r| r.label().to_string())
            .unwrap_or_default(),
    ];
    context.extend(
        siblings
            .iter()
            .map(|s| format!("{}:{}", s.name, s.field_type.as_str())),
    );
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let (kept, warnings) = dedupe(vec![
            FieldDescriptor::new("a", FieldType::String),
            FieldDescriptor::new("  ", FieldType::String),
            FieldDescriptor::new("a", FieldType::Integer),
            FieldDescriptor::new("b", FieldType::Float),
        ]);

        let names: Vec<&str> = kept.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(kept[0].field_type, FieldType::String);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.source == WarningSource::Metadata));
    }

    #[test]
    fn test_checksum_context_tracks_siblings() {
        let a = FieldDescriptor::new("lat", FieldType::Float);
        let b = FieldDescriptor::new("lon", FieldType::Float);
        let alone = checksum_context(&a, std::slice::from_ref(&a));
        let paired = checksum_context(&a, &[a.clone(), b]);
        assert_ne!(alone, paired);
    }

    #[test]
    fn test_read_failure_reasons() {
        assert_eq!(
            ReadFailure::TimedOut(Duration::from_millis(250)).into_reason(),
            UnscoredReason::TimedOut { after_ms: 250 }
        );
        assert_eq!(ReadFailure::Cancelled.into_reason(), UnscoredReason::Cancelled);
        assert_eq!(ReadFailure::Failed("down".into()).describe(), "down");
    }

    #[test]
    fn test_warning_serialization() {
        let warning = EvaluationWarning::new(
            WarningSource::Field {
                name: "geom".to_string(),
            },
            "timed out",
        );
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["source"]["kind"], "field");
        assert_eq!(json["source"]["name"], "geom");
    }
}
