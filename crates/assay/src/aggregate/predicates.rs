//! Dataset-level capability predicates folded from field reports.

use serde::{Deserialize, Serialize};

use crate::schema::{AddressRole, FieldReport, GeometryCandidate, ScoredField};
use crate::store::CatalogEntry;

/// Aggregation thresholds. Ratio thresholds are exclusive except
/// `linkage_min_ratio`, which is inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Roles that must each be covered by a tagged field.
    pub address_roles: Vec<AddressRole>,
    /// Minimum fullness of each required address field.
    pub address_min_fullness: f64,
    pub geometry_min_fullness: f64,
    pub geometry_min_validness: f64,
    pub geometry_min_adequacy: f64,
    /// Share of records linked to the reference registry.
    pub linkage_min_ratio: f64,
    /// Fields whose presence marks enrichment by the reference registry.
    pub enrichment_fields: Vec<String>,
    pub enrichment_min_fullness: f64,
    /// Provenance tags that mark enrichment.
    pub enrichment_tags: Vec<String>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            address_roles: AddressRole::ALL.to_vec(),
            address_min_fullness: 0.6,
            geometry_min_fullness: 0.5,
            geometry_min_validness: 0.5,
            geometry_min_adequacy: 0.5,
            linkage_min_ratio: 0.6,
            enrichment_fields: vec!["oarObject".to_string()],
            enrichment_min_fullness: 0.7,
            enrichment_tags: vec!["oar".to_string()],
        }
    }
}

/// Capability predicates of one dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetPredicates {
    pub has_address_features: bool,
    pub has_geometry_features: bool,
    pub has_address: bool,
    pub has_geometry: bool,
    pub is_connected: bool,
    pub is_enriched: bool,
    pub is_published: bool,
}

/// Results of the external service reads. `None` means the read failed or
/// the service had no answer.
#[derive(Debug, Clone, Default)]
pub struct ExternalSignals {
    pub linkage_ratio: Option<f64>,
    pub catalog: Option<CatalogEntry>,
}

fn exceeds(value: Option<f64>, min: f64) -> bool {
    value.is_some_and(|v| v > min)
}

/// Fold field reports and external signals into predicates.
///
/// Unscored fields contribute nothing. Pure: the same inputs always give
/// the same predicates.
pub fn fold(
    fields: &[FieldReport],
    signals: &ExternalSignals,
    config: &AggregationConfig,
) -> DatasetPredicates {
    let scored: Vec<&ScoredField> = fields.iter().filter_map(FieldReport::scored).collect();

    let has_address_features = scored.iter().any(|f| f.classification.is_address_feature);
    let has_geometry_features = scored.iter().any(|f| f.classification.is_geometry_feature);

    let has_address = !config.address_roles.is_empty()
        && config.address_roles.iter().all(|role| {
            scored.iter().any(|f| {
                f.descriptor.role == Some(*role) && f.metrics.fullness > config.address_min_fullness
            })
        });

    let proper_geometry = scored
        .iter()
        .filter(|f| f.classification.geometry == Some(GeometryCandidate::Declared))
        .filter(|f| {
            f.metrics.fullness > config.geometry_min_fullness
                && exceeds(f.metrics.validness, config.geometry_min_validness)
                && exceeds(f.metrics.adequacy, config.geometry_min_adequacy)
        })
        .count();
    let has_geometry = proper_geometry == 1;

    let is_connected = signals
        .linkage_ratio
        .is_some_and(|ratio| ratio >= config.linkage_min_ratio);

    let (is_enriched, is_published) = match &signals.catalog {
        Some(entry) => {
            let tagged = entry.provenance_tags.iter().any(|tag| {
                config
                    .enrichment_tags
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(tag))
            });
            let enriched_field = scored.iter().any(|f| {
                config.enrichment_fields.contains(&f.descriptor.name)
                    && f.metrics.fullness > config.enrichment_min_fullness
            });
            (tagged || enriched_field, entry.published)
        }
        None => (false, false),
    };

    DatasetPredicates {
        has_address_features,
        has_geometry_features,
        has_address,
        has_geometry,
        is_connected,
        is_enriched,
        is_published,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldClassification, FieldDescriptor, FieldMetrics, FieldType, UnscoredReason};

    fn metrics(fullness: f64) -> FieldMetrics {
        FieldMetrics {
            type_matching: Some(1.0),
            fullness,
            entropy: Some(1.0),
            indexed: false,
            validness: None,
            adequacy: None,
            total_count: 10,
            non_empty_count: (fullness * 10.0) as usize,
            distinct_count: 1,
        }
    }

    fn scored(descriptor: FieldDescriptor, metrics: FieldMetrics, classification: FieldClassification) -> FieldReport {
        FieldReport::Scored(ScoredField {
            descriptor,
            metrics,
            classification,
            locality: None,
        })
    }

    fn address_field(name: &str, role: AddressRole, fullness: f64) -> FieldReport {
        scored(
            FieldDescriptor::new(name, FieldType::String).with_role(role),
            metrics(fullness),
            FieldClassification::default(),
        )
    }

    fn geometry_field(name: &str, validness: f64, adequacy: f64) -> FieldReport {
        let mut m = metrics(1.0);
        m.validness = Some(validness);
        m.adequacy = Some(adequacy);
        scored(
            FieldDescriptor::new(name, FieldType::Geometry),
            m,
            FieldClassification {
                geometry: Some(GeometryCandidate::Declared),
                ..Default::default()
            },
        )
    }

    fn fold_default(fields: &[FieldReport]) -> DatasetPredicates {
        fold(fields, &ExternalSignals::default(), &AggregationConfig::default())
    }

    #[test]
    fn test_no_fields_all_false() {
        assert_eq!(fold_default(&[]), DatasetPredicates::default());
    }

    #[test]
    fn test_has_address_needs_every_role() {
        let mut fields: Vec<FieldReport> = AddressRole::ALL
            .iter()
            .map(|role| address_field(role.label(), *role, 0.9))
            .collect();
        assert!(fold_default(&fields).has_address);

        fields.pop();
        assert!(!fold_default(&fields).has_address);
    }

    #[test]
    fn test_address_fullness_is_exclusive() {
        let fields: Vec<FieldReport> = AddressRole::ALL
            .iter()
            .map(|role| address_field(role.label(), *role, 0.6))
            .collect();
        assert!(!fold_default(&fields).has_address);
    }

    #[test]
    fn test_has_geometry_requires_exactly_one() {
        let one = vec![geometry_field("geom", 0.9, 0.9)];
        assert!(fold_default(&one).has_geometry);

        let two = vec![geometry_field("a", 0.9, 0.9), geometry_field("b", 0.9, 0.9)];
        assert!(!fold_default(&two).has_geometry);

        let bad = vec![geometry_field("geom", 0.5, 0.9)];
        assert!(!fold_default(&bad).has_geometry);

        let one_good_one_bad = vec![geometry_field("a", 0.9, 0.9), geometry_field("b", 0.1, 0.0)];
        assert!(fold_default(&one_good_one_bad).has_geometry);
    }

    #[test]
    fn test_unscored_fields_contribute_nothing() {
        let fields = vec![FieldReport::unscored(
            FieldDescriptor::new("geom", FieldType::Geometry),
            UnscoredReason::TimedOut { after_ms: 10 },
        )];
        assert_eq!(fold_default(&fields), DatasetPredicates::default());
    }

    #[test]
    fn test_connected_threshold_is_inclusive() {
        let config = AggregationConfig::default();
        let at = ExternalSignals {
            linkage_ratio: Some(0.6),
            catalog: None,
        };
        let below = ExternalSignals {
            linkage_ratio: Some(0.59),
            catalog: None,
        };
        assert!(fold(&[], &at, &config).is_connected);
        assert!(!fold(&[], &below, &config).is_connected);
        assert!(!fold(&[], &ExternalSignals::default(), &config).is_connected);
    }

    #[test]
    fn test_enrichment_and_publication() {
        let config = AggregationConfig::default();
        let tagged = ExternalSignals {
            linkage_ratio: None,
            catalog: Some(CatalogEntry {
                provenance_tags: vec!["OAR".to_string()],
                published: true,
            }),
        };
        let p = fold(&[], &tagged, &config);
        assert!(p.is_enriched);
        assert!(p.is_published);

        let untagged = ExternalSignals {
            linkage_ratio: None,
            catalog: Some(CatalogEntry::default()),
        };
        let oar = scored(
            FieldDescriptor::new("oarObject", FieldType::Unknown),
            metrics(0.8),
            FieldClassification::default(),
        );
        assert!(fold(&[oar.clone()], &untagged, &config).is_enriched);
        // Catalog unavailable: enrichment cannot be established.
        assert!(!fold(&[oar], &ExternalSignals::default(), &config).is_enriched);
    }
}
