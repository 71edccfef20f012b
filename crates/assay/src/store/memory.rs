//! In-memory store for tests and embedding.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;

use super::provider::{CatalogEntry, CatalogService, LinkageService, MetadataStore, RawValueStore};
use crate::error::{AssayError, Result};
use crate::input::RawValue;
use crate::schema::FieldDescriptor;

/// One dataset held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    fields: Vec<FieldDescriptor>,
    values: HashMap<String, Vec<RawValue>>,
    linkage_ratio: Option<f64>,
    catalog: CatalogEntry,
    failing: Vec<Seam>,
    delays: HashMap<Seam, Duration>,
}

/// A read path that can be made to fail or stall.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Seam {
    Metadata,
    Values(String),
    Linkage,
    Catalog,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field and its values.
    pub fn field(mut self, descriptor: FieldDescriptor, values: Vec<RawValue>) -> Self {
        self.values.insert(descriptor.name.clone(), values);
        self.fields.push(descriptor);
        self
    }

    pub fn linkage(mut self, ratio: f64) -> Self {
        self.linkage_ratio = Some(ratio);
        self
    }

    pub fn catalog(mut self, entry: CatalogEntry) -> Self {
        self.catalog = entry;
        self
    }

    /// Make reads through `seam` fail.
    pub fn failing(mut self, seam: Seam) -> Self {
        self.failing.push(seam);
        self
    }

    /// Make reads through `seam` wait for `delay` first.
    pub fn delayed(mut self, seam: Seam, delay: Duration) -> Self {
        self.delays.insert(seam, delay);
        self
    }
}

/// Datasets kept in memory, with read counters.
#[derive(Default)]
pub struct MemoryStore {
    datasets: RwLock<HashMap<String, MemoryDataset>>,
    descriptor_reads: AtomicUsize,
    value_reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(self, dataset_id: impl Into<String>, dataset: MemoryDataset) -> Self {
        self.insert(dataset_id, dataset);
        self
    }

    /// Add or replace a dataset.
    pub fn insert(&self, dataset_id: impl Into<String>, dataset: MemoryDataset) {
        if let Ok(mut datasets) = self.datasets.write() {
            datasets.insert(dataset_id.into(), dataset);
        }
    }

    /// Number of descriptor reads served so far.
    pub fn descriptor_reads(&self) -> usize {
        self.descriptor_reads.load(Ordering::SeqCst)
    }

    /// Number of field value reads served so far.
    pub fn value_reads(&self) -> usize {
        self.value_reads.load(Ordering::SeqCst)
    }

    /// Run `read` against a dataset after applying the seam's delay and
    /// failure settings.
    async fn read<T>(
        &self,
        store: &'static str,
        dataset_id: &str,
        seam: Seam,
        read: impl FnOnce(&MemoryDataset) -> Result<T>,
    ) -> Result<T> {
        let delay = self.with_dataset_ref(dataset_id, |d| d.delays.get(&seam).copied())?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.with_dataset_ref(dataset_id, |dataset| {
            if dataset.failing.contains(&seam) {
                return Err(AssayError::store(store, dataset_id, "injected failure"));
            }
            read(dataset)
        })?
    }

    fn with_dataset_ref<T>(&self, dataset_id: &str, f: impl FnOnce(&MemoryDataset) -> T) -> Result<T> {
        let datasets = self
            .datasets
            .read()
            .map_err(|_| AssayError::store("memory", dataset_id, "lock poisoned"))?;
        let dataset = datasets
            .get(dataset_id)
            .ok_or_else(|| AssayError::store("memory", dataset_id, "unknown dataset"))?;
        Ok(f(dataset))
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn field_descriptors(&self, dataset_id: &str) -> Result<Vec<FieldDescriptor>> {
        self.descriptor_reads.fetch_add(1, Ordering::SeqCst);
        self.read("metadata store", dataset_id, Seam::Metadata, |d| Ok(d.fields.clone()))
            .await
    }
}

#[async_trait]
impl RawValueStore for MemoryStore {
    async fn field_values(
        &self,
        dataset_id: &str,
        field: &str,
        limit: Option<usize>,
    ) -> Result<Vec<RawValue>> {
        self.value_reads.fetch_add(1, Ordering::SeqCst);
        self.read(
            "raw value store",
            dataset_id,
            Seam::Values(field.to_string()),
            |d| {
                let values = d.values.get(field).ok_or_else(|| {
                    AssayError::store("raw value store", dataset_id, format!("unknown field '{}'", field))
                })?;
                let take = limit.unwrap_or(values.len()).min(values.len());
                Ok(values[..take].to_vec())
            },
        )
        .await
    }
}

#[async_trait]
impl LinkageService for MemoryStore {
    async fn linkage_ratio(&self, dataset_id: &str) -> Result<Option<f64>> {
        self.read("linkage service", dataset_id, Seam::Linkage, |d| Ok(d.linkage_ratio))
            .await
    }
}

#[async_trait]
impl CatalogService for MemoryStore {
    async fn catalog_entry(&self, dataset_id: &str) -> Result<CatalogEntry> {
        self.read("catalog service", dataset_id, Seam::Catalog, |d| Ok(d.catalog.clone()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    fn store() -> MemoryStore {
        MemoryStore::new().with_dataset(
            "ds",
            MemoryDataset::new()
                .field(
                    FieldDescriptor::new("name", FieldType::String),
                    vec![RawValue::text("a"), RawValue::text("b"), RawValue::text("c")],
                )
                .linkage(0.75)
                .failing(Seam::Catalog),
        )
    }

    #[tokio::test]
    async fn test_reads_and_counters() {
        let store = store();
        let fields = store.field_descriptors("ds").await.unwrap();
        assert_eq!(fields.len(), 1);

        let values = store.field_values("ds", "name", Some(2)).await.unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(store.descriptor_reads(), 1);
        assert_eq!(store.value_reads(), 1);
        assert_eq!(store.linkage_ratio("ds").await.unwrap(), Some(0.75));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = store();
        assert!(store.catalog_entry("ds").await.is_err());
        assert!(store.field_values("ds", "missing", None).await.is_err());
        assert!(store.field_descriptors("other").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay() {
        let store = MemoryStore::new().with_dataset(
            "ds",
            MemoryDataset::new().delayed(Seam::Linkage, Duration::from_secs(5)),
        );
        let started = tokio::time::Instant::now();
        store.linkage_ratio("ds").await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
