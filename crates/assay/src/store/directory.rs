//! Datasets stored as delimited files in a directory.
//!
//! For a dataset id `parcels` the store reads:
//!
//! - `parcels.csv` or `parcels.tsv`: the values, one column per field
//! - `parcels.fields.json` (optional): field descriptors; when absent they
//!   are inferred from the column contents
//! - `parcels.catalog.json` (optional): catalog entry and linkage ratio

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;

use super::provider::{CatalogEntry, CatalogService, LinkageService, MetadataStore, RawValueStore};
use crate::error::{AssayError, Result};
use crate::inference::MetricCalculator;
use crate::input::{Parser, ParserConfig, RawValue, SourceMetadata, Table};
use crate::schema::FieldDescriptor;

const DATA_EXTENSIONS: &[&str] = &["csv", "tsv"];

/// Parsed tables kept per store.
const TABLE_CACHE_CAPACITY: u64 = 64;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DescriptorFile {
    List(Vec<FieldDescriptor>),
    Document { fields: Vec<FieldDescriptor> },
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(flatten)]
    entry: CatalogEntry,
    #[serde(default)]
    linkage_ratio: Option<f64>,
}

/// Modification time and size of a data file when it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    async fn read(path: &Path) -> Result<Self> {
        let meta = tokio::fs::metadata(path).await.map_err(|source| AssayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

/// A loaded data file.
#[derive(Debug)]
pub struct LoadedTable {
    pub table: Table,
    pub source: SourceMetadata,
    stamp: FileStamp,
}

/// Reads datasets from `<root>/<dataset_id>.{csv,tsv}` and sidecar files.
pub struct DirectoryStore {
    root: PathBuf,
    parser: ParserConfig,
    tables: Cache<String, Arc<LoadedTable>>,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            parser: ParserConfig::default(),
            tables: Cache::builder()
                .max_capacity(TABLE_CACHE_CAPACITY)
                .support_invalidation_closures()
                .build(),
        }
    }

    /// Read data files with `config`, e.g. to cap the rows loaded.
    pub fn with_parser(mut self, config: ParserConfig) -> Self {
        self.parser = config;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Dataset ids with a data file in the root directory, sorted.
    pub fn dataset_ids(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.root).map_err(|source| AssayError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| DATA_EXTENSIONS.contains(&e))
            })
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Load (or fetch the cached) table of a dataset.
    ///
    /// A cached table is reused only while the file keeps its modification
    /// time and size.
    pub async fn table(&self, dataset_id: &str) -> Result<Arc<LoadedTable>> {
        let path = self.data_path(dataset_id)?;
        let stamp = FileStamp::read(&path).await?;
        if let Some(cached) = self.tables.get(dataset_id).await {
            if cached.stamp == stamp {
                return Ok(cached);
            }
            tracing::debug!(dataset = %dataset_id, "data file changed, reloading");
            self.tables.invalidate(dataset_id).await;
        }

        let dataset = dataset_id.to_string();
        let parser = self.parser.clone();
        self.tables
            .try_get_with(dataset_id.to_string(), async move {
                tokio::task::spawn_blocking(move || {
                    let (table, source) = Parser::with_config(parser).parse_file(&path)?;
                    tracing::debug!(
                        dataset = %dataset,
                        rows = table.row_count(),
                        columns = table.column_count(),
                        "loaded data file"
                    );
                    Ok::<_, AssayError>(Arc::new(LoadedTable {
                        table,
                        source,
                        stamp,
                    }))
                })
                .await
                .map_err(|e| AssayError::store("directory store", dataset_id, e.to_string()))?
            })
            .await
            .map_err(|e: Arc<AssayError>| AssayError::store("directory store", dataset_id, e.to_string()))
    }

    /// File metadata of a dataset's data file as last loaded.
    pub async fn source(&self, dataset_id: &str) -> Result<SourceMetadata> {
        Ok(self.table(dataset_id).await?.source.clone())
    }

    /// Drop the cached table of a dataset.
    pub fn forget(&self, dataset_id: &str) {
        let dataset_id = dataset_id.to_string();
        // Cannot fail: the builder enables invalidation closures.
        let _ = self
            .tables
            .invalidate_entries_if(move |key, _| *key == dataset_id);
    }

    fn checked_id<'a>(&self, dataset_id: &'a str) -> Result<&'a str> {
        let valid = !dataset_id.is_empty()
            && dataset_id != "."
            && dataset_id != ".."
            && !dataset_id.contains(['/', '\\']);
        if valid {
            Ok(dataset_id)
        } else {
            Err(AssayError::store(
                "directory store",
                dataset_id,
                "dataset id must be a plain file stem",
            ))
        }
    }

    fn data_path(&self, dataset_id: &str) -> Result<PathBuf> {
        let id = self.checked_id(dataset_id)?;
        DATA_EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", id, ext)))
            .find(|path| path.is_file())
            .ok_or_else(|| AssayError::store("directory store", dataset_id, "no data file"))
    }

    fn sidecar(&self, dataset_id: &str, suffix: &str) -> Result<Option<PathBuf>> {
        let id = self.checked_id(dataset_id)?;
        let path = self.root.join(format!("{}.{}.json", id, suffix));
        Ok(path.is_file().then_some(path))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
        let bytes = tokio::fs::read(path).await.map_err(|source| AssayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn catalog_file(&self, dataset_id: &str) -> Result<CatalogFile> {
        match self.sidecar(dataset_id, "catalog")? {
            Some(path) => Self::read_json(&path).await,
            None => Ok(CatalogFile::default()),
        }
    }
}

#[async_trait]
impl MetadataStore for DirectoryStore {
    async fn field_descriptors(&self, dataset_id: &str) -> Result<Vec<FieldDescriptor>> {
        if let Some(path) = self.sidecar(dataset_id, "fields")? {
            let file: DescriptorFile = Self::read_json(&path).await?;
            return Ok(match file {
                DescriptorFile::List(fields) | DescriptorFile::Document { fields } => fields,
            });
        }

        let loaded = self.table(dataset_id).await?;
        let calculator = MetricCalculator::new();
        Ok(loaded
            .table
            .headers()
            .iter()
            .filter_map(|name| {
                let column = loaded.table.column(name)?;
                Some(FieldDescriptor::new(name.clone(), calculator.infer_type(column)))
            })
            .collect())
    }
}

#[async_trait]
impl RawValueStore for DirectoryStore {
    async fn field_values(
        &self,
        dataset_id: &str,
        field: &str,
        _limit: Option<usize>,
    ) -> Result<Vec<RawValue>> {
        let loaded = self.table(dataset_id).await?;
        let column = loaded.table.column(field).ok_or_else(|| {
            AssayError::store("directory store", dataset_id, format!("unknown field '{}'", field))
        })?;
        Ok(column.iter().map(|cell| RawValue::from(cell.as_str())).collect())
    }

    fn invalidate(&self, dataset_id: &str) {
        self.forget(dataset_id);
    }
}

#[async_trait]
impl LinkageService for DirectoryStore {
    async fn linkage_ratio(&self, dataset_id: &str) -> Result<Option<f64>> {
        Ok(self.catalog_file(dataset_id).await?.linkage_ratio)
    }
}

#[async_trait]
impl CatalogService for DirectoryStore {
    async fn catalog_entry(&self, dataset_id: &str) -> Result<CatalogEntry> {
        Ok(self.catalog_file(dataset_id).await?.entry)
    }
}
