//! Field profiling: metrics, classification and locality for one field.

use std::sync::Arc;

use crate::dictionary::DictionaryCatalog;
use crate::error::Result;
use crate::input::{FieldSample, RawValue};
use crate::schema::{
    AddressRole, FieldDescriptor, FieldReport, GeometryCandidate, ScoredField, UnscoredReason,
};

use super::locality::{LocalityConfig, LocalityDetector};
use super::semantic::{ClassifierConfig, FieldClassifier};
use super::statistical::{MetricCalculator, MetricsConfig};

/// Produces a [`FieldReport`] from a descriptor and its sample.
///
/// Pure and synchronous; safe to run on a blocking worker.
pub struct FieldProfiler {
    calculator: MetricCalculator,
    classifier: FieldClassifier,
    locality: LocalityDetector,
    dictionary: Arc<DictionaryCatalog>,
}

impl FieldProfiler {
    /// Create a profiler with default settings over the built-in dictionary.
    pub fn new() -> Result<Self> {
        Ok(Self {
            calculator: MetricCalculator::new(),
            classifier: FieldClassifier::new()?,
            locality: LocalityDetector::new(),
            dictionary: Arc::new(DictionaryCatalog::builtin().clone()),
        })
    }

    pub fn with_config(
        dictionary: Arc<DictionaryCatalog>,
        metrics: MetricsConfig,
        classifier: ClassifierConfig,
        locality: LocalityConfig,
    ) -> Result<Self> {
        Ok(Self {
            calculator: MetricCalculator::with_config(metrics),
            classifier: FieldClassifier::with_config(classifier)?,
            locality: LocalityDetector::with_config(locality),
            dictionary,
        })
    }

    /// Replace the classifier, e.g. to install a custom axis pairing.
    pub fn with_classifier(mut self, classifier: FieldClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Profile one field. `siblings` is the dataset's full descriptor list.
    pub fn profile(
        &self,
        descriptor: &FieldDescriptor,
        sample: &FieldSample,
        siblings: &[FieldDescriptor],
    ) -> FieldReport {
        let Some(mut metrics) = self.calculator.compute(descriptor, sample) else {
            return FieldReport::unscored(descriptor.clone(), UnscoredReason::EmptySample);
        };

        let classification =
            self.classifier
                .classify(descriptor, sample, &metrics, siblings, &self.dictionary);

        // Raw geometry text carries the same quality signals as a declared field.
        if classification.geometry == Some(GeometryCandidate::RawText) {
            let non_empty: Vec<&RawValue> = sample.non_empty().collect();
            let quality = self.calculator.geometry_quality(&non_empty);
            metrics.validness = quality.validness;
            metrics.adequacy = quality.adequacy;
        }

        let locality = match descriptor.role {
            Some(role @ (AddressRole::Region | AddressRole::Municipality)) => {
                self.locality
                    .detect(role, sample, metrics.entropy, &self.dictionary)
            }
            _ => None,
        };

        FieldReport::Scored(ScoredField {
            descriptor: descriptor.clone(),
            metrics,
            classification,
            locality,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    fn texts(values: &[&str]) -> FieldSample {
        FieldSample::new(values.iter().map(|v| RawValue::from(*v)).collect())
    }

    #[test]
    fn test_empty_sample_is_unscored() {
        let profiler = FieldProfiler::new().unwrap();
        let descriptor = FieldDescriptor::new("f", FieldType::String);
        let report = profiler.profile(&descriptor, &FieldSample::default(), &[]);

        assert_eq!(
            report,
            FieldReport::unscored(descriptor, UnscoredReason::EmptySample)
        );
    }

    #[test]
    fn test_geometry_field_report() {
        let profiler = FieldProfiler::new().unwrap();
        let descriptor = FieldDescriptor::new("geom", FieldType::Geometry).indexed(true);
        let report = profiler.profile(
            &descriptor,
            &texts(&["POINT(37.6 55.7)", "POINT(30.3 59.9)"]),
            &[descriptor.clone()],
        );

        let scored = report.scored().unwrap();
        assert!(scored.metrics.indexed);
        assert_eq!(scored.metrics.validness, Some(1.0));
        assert_eq!(scored.metrics.adequacy, Some(1.0));
        assert_eq!(scored.classification.geometry, Some(GeometryCandidate::Declared));
        assert!(scored.locality.is_none());
    }

    #[test]
    fn test_raw_geometry_text_gets_quality() {
        let profiler = FieldProfiler::new().unwrap();
        let descriptor = FieldDescriptor::new("wkt", FieldType::String);
        let report = profiler.profile(
            &descriptor,
            &texts(&["POINT(37.6 55.7)", "POINT(30.3 59.9)", "POINT("]),
            &[descriptor.clone()],
        );

        let scored = report.scored().unwrap();
        assert_eq!(scored.classification.geometry, Some(GeometryCandidate::RawText));
        assert!(scored.classification.is_geometry_feature);
        assert_eq!(scored.metrics.validness, Some(2.0 / 3.0));
        assert_eq!(scored.metrics.adequacy, Some(1.0));
    }

    #[test]
    fn test_plain_string_has_no_geometry_quality() {
        let profiler = FieldProfiler::new().unwrap();
        let descriptor = FieldDescriptor::new("name", FieldType::String);
        let report = profiler.profile(&descriptor, &texts(&["школа", "больница"]), &[]);

        let scored = report.scored().unwrap();
        assert!(scored.metrics.validness.is_none());
        assert!(scored.metrics.adequacy.is_none());
    }

    #[test]
    fn test_region_field_gets_locality() {
        let profiler = FieldProfiler::new().unwrap();
        let descriptor =
            FieldDescriptor::new("region", FieldType::String).with_role(AddressRole::Region);
        let report = profiler.profile(&descriptor, &texts(&["Тверская обл"; 10]), &[]);

        let locality = report.scored().unwrap().locality.clone().unwrap();
        assert!(locality.single_value);
    }

    #[test]
    fn test_profile_is_deterministic() {
        let profiler = FieldProfiler::new().unwrap();
        let descriptor = FieldDescriptor::new("address", FieldType::String);
        let sample = texts(&["Москва, Проспект Мира, 12", "Тверь, ул. Советская, д. 5"]);

        assert_eq!(
            profiler.profile(&descriptor, &sample, &[]),
            profiler.profile(&descriptor, &sample, &[])
        );
    }
}
