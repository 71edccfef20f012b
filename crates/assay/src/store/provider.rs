//! External store and service traits.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::input::RawValue;
use crate::schema::FieldDescriptor;

/// Catalog record of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Provenance tags, e.g. the registry the dataset was enriched from.
    #[serde(default)]
    pub provenance_tags: Vec<String>,
    /// Whether the dataset is published as a map layer.
    #[serde(default)]
    pub published: bool,
}

/// Source of field descriptors.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Fields of `dataset_id`, in a stable order.
    async fn field_descriptors(&self, dataset_id: &str) -> Result<Vec<FieldDescriptor>>;
}

/// Source of raw field values.
#[async_trait]
pub trait RawValueStore: Send + Sync {
    /// Values of one field. `limit` is a hint: stores may return more, and
    /// the caller bounds the sample.
    async fn field_values(
        &self,
        dataset_id: &str,
        field: &str,
        limit: Option<usize>,
    ) -> Result<Vec<RawValue>>;

    /// Drop anything the store keeps cached for `dataset_id`.
    fn invalidate(&self, _dataset_id: &str) {}
}

/// Linkage of dataset records to the reference address registry.
#[async_trait]
pub trait LinkageService: Send + Sync {
    /// Share of linked records, or `None` when unknown.
    async fn linkage_ratio(&self, dataset_id: &str) -> Result<Option<f64>>;
}

/// Dataset catalog.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn catalog_entry(&self, dataset_id: &str) -> Result<CatalogEntry>;
}

/// The four external seams an evaluation reads from.
#[derive(Clone)]
pub struct Stores {
    pub metadata: Arc<dyn MetadataStore>,
    pub values: Arc<dyn RawValueStore>,
    pub linkage: Arc<dyn LinkageService>,
    pub catalog: Arc<dyn CatalogService>,
}

impl Stores {
    /// Use one backend for every seam.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: MetadataStore + RawValueStore + LinkageService + CatalogService + 'static,
    {
        Self {
            metadata: store.clone(),
            values: store.clone(),
            linkage: store.clone(),
            catalog: store,
        }
    }
}
