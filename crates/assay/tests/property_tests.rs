//! Property-based tests for field metrics, tokenization and the decision
//! table.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p assay --test property_tests
//!
//! # More cases
//! PROPTEST_CASES=10000 cargo test -p assay --test property_tests
//! ```

use proptest::prelude::*;

use assay::dictionary::{tokenize, DictionaryCatalog};
use assay::geometry::parse_value;
use assay::inference::{entropy, looks_like_geometry, FieldProfiler, MetricCalculator};
use assay::input::FieldSample;
use assay::schema::GeometryCandidate;
use assay::{DatasetPredicates, FieldDescriptor, FieldType, Operation, RawValue, RecommendationEngine};

// =============================================================================
// Test Strategies
// =============================================================================

/// Cells as they come out of a CSV file: mostly text, some blanks.
fn cell() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-zA-Zа-яА-Я0-9 ,.-]{1,20}",
        1 => Just(String::new()),
        1 => Just("   ".to_string()),
        1 => "-?[0-9]{1,6}(\\.[0-9]{1,3})?",
    ]
}

fn column() -> impl Strategy<Value = Vec<RawValue>> {
    prop::collection::vec(cell().prop_map(RawValue::text), 1..60)
}

fn field_type() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        Just(FieldType::String),
        Just(FieldType::Integer),
        Just(FieldType::Float),
        Just(FieldType::Date),
        Just(FieldType::Geometry),
        Just(FieldType::Unknown),
    ]
}

fn in_unit(value: Option<f64>) -> bool {
    value.is_none_or(|v| (0.0..=1.0).contains(&v))
}

fn predicates(bits: u8) -> DatasetPredicates {
    DatasetPredicates {
        has_address_features: bits & 1 != 0,
        has_geometry_features: bits & 2 != 0,
        has_address: bits & 4 != 0,
        has_geometry: bits & 8 != 0,
        is_connected: bits & 16 != 0,
        is_enriched: bits & 32 != 0,
        is_published: bits & 64 != 0,
    }
}

// =============================================================================
// Metric Properties
// =============================================================================

mod metric_tests {
    use super::*;

    proptest! {
        /// Every metric lies in [0, 1] whatever the values and declared type.
        #[test]
        fn metrics_stay_in_unit_range(values in column(), ty in field_type()) {
            let calculator = MetricCalculator::new();
            let descriptor = FieldDescriptor::new("f", ty);
            let metrics = calculator
                .compute(&descriptor, &FieldSample::new(values))
                .unwrap();

            prop_assert!((0.0..=1.0).contains(&metrics.fullness));
            prop_assert!(in_unit(metrics.type_matching));
            prop_assert!(in_unit(metrics.entropy));
            prop_assert!(in_unit(metrics.validness));
            prop_assert!(in_unit(metrics.adequacy));
            prop_assert!(metrics.distinct_count <= metrics.non_empty_count);
            prop_assert!(metrics.non_empty_count <= metrics.total_count);
        }

        /// Geometry metrics only exist for declared geometry and raw geometry text.
        #[test]
        fn geometry_metrics_only_for_geometry_candidates(values in column(), ty in field_type()) {
            prop_assume!(ty != FieldType::Geometry);
            let profiler = FieldProfiler::new().unwrap();
            let descriptor = FieldDescriptor::new("f", ty);
            let report = profiler.profile(&descriptor, &FieldSample::new(values), &[]);
            let scored = report.scored().unwrap();
            prop_assume!(scored.classification.geometry != Some(GeometryCandidate::RawText));
            prop_assert!(scored.metrics.validness.is_none());
            prop_assert!(scored.metrics.adequacy.is_none());
        }

        /// A text column of points reports full validness.
        #[test]
        fn raw_point_text_is_valid(
            points in prop::collection::vec((20.0f64..180.0, 42.0f64..80.0), 1..30),
        ) {
            let values = points
                .iter()
                .map(|(x, y)| RawValue::text(format!("POINT({} {})", x, y)))
                .collect();
            let profiler = FieldProfiler::new().unwrap();
            let descriptor = FieldDescriptor::new("shape", FieldType::String);
            let report = profiler.profile(&descriptor, &FieldSample::new(values), &[]);
            let scored = report.scored().unwrap();
            prop_assert_eq!(scored.classification.geometry.clone(), Some(GeometryCandidate::RawText));
            prop_assert_eq!(scored.metrics.validness, Some(1.0));
            prop_assert!(in_unit(scored.metrics.adequacy));
        }

        /// A column of blanks is empty, and its ratios are not applicable.
        #[test]
        fn blank_column_is_not_applicable(count in 1usize..50, ty in field_type()) {
            let values = vec![RawValue::text(""); count];
            let metrics = MetricCalculator::new()
                .compute(&FieldDescriptor::new("f", ty), &FieldSample::new(values))
                .unwrap();
            prop_assert_eq!(metrics.fullness, 0.0);
            prop_assert!(metrics.type_matching.is_none());
            prop_assert!(metrics.entropy.is_none());
        }

        /// Identical values give entropy 0, all-distinct values entropy 1.
        #[test]
        fn entropy_extremes(value in "[a-z]{1,8}", count in 2usize..40) {
            let same = FieldSample::new(vec![RawValue::text(value.clone()); count]);
            let distinct = FieldSample::new(
                (0..count).map(|i| RawValue::text(format!("{}{}", value, i))).collect(),
            );
            let calculator = MetricCalculator::new();
            let descriptor = FieldDescriptor::new("f", FieldType::String);

            prop_assert_eq!(calculator.compute(&descriptor, &same).unwrap().entropy, Some(0.0));
            prop_assert_eq!(calculator.compute(&descriptor, &distinct).unwrap().entropy, Some(1.0));
        }

        /// Entropy grows with the number of distinct values.
        #[test]
        fn entropy_is_monotone(n in 2usize..500, d in 1usize..500) {
            prop_assume!(d < n);
            let lower = entropy(n, d).unwrap();
            let higher = entropy(n, d + 1).unwrap();
            prop_assert!(lower < higher);
        }

        /// Bounded samples are reproducible and respect the limit.
        #[test]
        fn bounded_sample_is_deterministic(values in column(), limit in 1usize..30, seed: u64) {
            let a = FieldSample::new(values.clone()).bounded(Some(limit), seed);
            let b = FieldSample::new(values.clone()).bounded(Some(limit), seed);
            prop_assert_eq!(a.values(), b.values());
            prop_assert_eq!(a.len(), values.len().min(limit));
        }
    }
}

// =============================================================================
// Tokenizer Properties
// =============================================================================

mod token_tests {
    use super::*;

    proptest! {
        /// A type word inside a longer word is never a match.
        #[test]
        fn embedded_type_word_never_matches(
            prefix in "[a-z]{1,5}",
            word in prop_oneof![Just("ул"), Just("пр"), Just("д"), Just("обл")],
            suffix in "[a-z]{0,5}",
        ) {
            let text = format!("{}{}{}", prefix, word, suffix);
            let tokens = tokenize(&text);
            prop_assert!(!DictionaryCatalog::builtin().address_tokens().matches(&tokens));
        }

        /// A type word delimited by spaces or punctuation always matches.
        #[test]
        fn delimited_type_word_matches(
            before in "[a-z]{1,8}",
            word in prop_oneof![Just("ул."), Just("Проспект"), Just("д,"), Just("обл")],
            after in "[a-z0-9]{1,8}",
        ) {
            let text = format!("{} {} {}", before, word, after);
            let tokens = tokenize(&text);
            prop_assert!(DictionaryCatalog::builtin().address_tokens().matches(&tokens));
        }

        /// Tokens are never empty and carry no separators.
        #[test]
        fn tokens_are_clean(text in "\\PC{0,80}") {
            for token in tokenize(&text) {
                prop_assert!(!token.is_empty());
                prop_assert!(!token.chars().any(char::is_whitespace));
                prop_assert!(!token.contains(','));
            }
        }
    }
}

// =============================================================================
// Geometry Properties
// =============================================================================

mod geometry_tests {
    use super::*;

    proptest! {
        /// Geometry detection and parsing never panic.
        #[test]
        fn geometry_parsing_never_panics(text in "\\PC{0,120}") {
            let _ = looks_like_geometry(&text, DictionaryCatalog::builtin());
            let _ = parse_value(&RawValue::text(text));
        }

        /// Well-formed points parse.
        #[test]
        fn points_parse(x in -180.0f64..180.0, y in -90.0f64..90.0) {
            let text = format!("POINT({} {})", x, y);
            prop_assert!(looks_like_geometry(&text, DictionaryCatalog::builtin()));
            prop_assert!(parse_value(&RawValue::text(text)).is_ok());
        }
    }
}

// =============================================================================
// Decision Table
// =============================================================================

#[test]
fn decision_table_covers_every_combination() {
    for bits in 0u8..128 {
        let p = predicates(bits);
        let set = RecommendationEngine::recommend(&p);

        assert_eq!(set, RecommendationEngine::recommend(&p), "bits {:07b}", bits);
        assert_eq!(set.iter().count(), Operation::ALL.len());

        assert_eq!(
            set.is_offered(Operation::ParseAddress),
            !p.has_address && p.has_address_features
        );
        assert_eq!(
            set.is_offered(Operation::TransformGeometry),
            !p.has_geometry && p.has_geometry_features
        );
        assert_eq!(
            set.is_offered(Operation::LinkRecords),
            !p.is_connected && (p.has_geometry || p.has_address)
        );
        assert_eq!(set.is_offered(Operation::Publish), p.has_geometry);
        assert_eq!(set.is_offered(Operation::ShowOnMap), p.is_published);
        assert!(set.is_offered(Operation::ConfigureMetadata));
        assert!(set.is_offered(Operation::Export));
    }
}

#[test]
fn enrichment_never_changes_recommendations() {
    for bits in 0u8..64 {
        let plain = predicates(bits & !32);
        let enriched = predicates(bits | 32);
        assert_eq!(
            RecommendationEngine::recommend(&plain),
            RecommendationEngine::recommend(&enriched)
        );
    }
}
