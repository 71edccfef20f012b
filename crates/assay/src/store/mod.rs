//! Metadata, raw value, linkage and catalog backends.

mod directory;
mod memory;
mod provider;

pub use directory::{DirectoryStore, LoadedTable};
pub use memory::{MemoryDataset, MemoryStore, Seam};
pub use provider::{
    CatalogEntry, CatalogService, LinkageService, MetadataStore, RawValueStore, Stores,
};
