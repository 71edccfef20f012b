//! Operations that can be offered for a dataset.

use serde::{Deserialize, Serialize};

use crate::aggregate::DatasetPredicates;

/// A data-enrichment capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Split free-text addresses into structured fields.
    ParseAddress,
    /// Build geometry from raw text or coordinate pairs.
    TransformGeometry,
    /// Link records to the reference registry.
    LinkRecords,
    /// Publish the dataset as a map layer.
    Publish,
    /// Open the published layer on a map.
    ShowOnMap,
    /// Edit dataset metadata.
    ConfigureMetadata,
    /// Export the dataset.
    Export,
}

impl Operation {
    /// Every operation in display order.
    pub const ALL: [Operation; 7] = [
        Operation::ParseAddress,
        Operation::TransformGeometry,
        Operation::LinkRecords,
        Operation::Publish,
        Operation::ShowOnMap,
        Operation::ConfigureMetadata,
        Operation::Export,
    ];

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::ParseAddress => "parse address",
            Operation::TransformGeometry => "transform geometry",
            Operation::LinkRecords => "link records",
            Operation::Publish => "publish",
            Operation::ShowOnMap => "show on map",
            Operation::ConfigureMetadata => "configure metadata",
            Operation::Export => "export",
        }
    }

    /// The decision table row for this operation.
    pub fn offered_when(&self, p: &DatasetPredicates) -> bool {
        match self {
            Operation::ParseAddress => !p.has_address && p.has_address_features,
            Operation::TransformGeometry => !p.has_geometry && p.has_geometry_features,
            Operation::LinkRecords => !p.is_connected && (p.has_geometry || p.has_address),
            Operation::Publish => p.has_geometry,
            Operation::ShowOnMap => p.is_published,
            Operation::ConfigureMetadata | Operation::Export => true,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
