//! Parsed tables and their file metadata.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about a loaded data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, ...).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was read.
    pub loaded_at: DateTime<Utc>,
}

/// Column-major tabular data. Every column has `row_count` cells.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Vec<String>>,
    row_count: usize,
}

impl Table {
    /// Build a table from row-major records, padding or truncating each
    /// record to the header width.
    pub fn from_rows(headers: Vec<String>, rows: impl IntoIterator<Item = Vec<String>>) -> Self {
        let width = headers.len();
        let mut columns: Vec<Vec<String>> = vec![Vec::new(); width];
        let mut row_count = 0;

        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.push(cells.next().unwrap_or_default());
            }
            row_count += 1;
        }

        Self {
            headers,
            columns,
            row_count,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Cells of the first column named `name`.
    pub fn column(&self, name: &str) -> Option<&[String]> {
        let index = self.headers.iter().position(|h| h == name)?;
        self.columns.get(index).map(|c| c.as_slice())
    }
}
