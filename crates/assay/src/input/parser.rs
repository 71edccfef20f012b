//! Delimited-text reader backing the directory store.

use std::path::Path;

use chrono::Utc;
use sha2::{Digest, Sha256};

use super::source::{SourceMetadata, Table};
use crate::error::{AssayError, Result};

/// Delimiters tried during detection, in tie-break order.
const DELIMITERS: &[u8] = &[b';', b',', b'\t', b'|'];

/// Lines inspected during delimiter detection.
const DETECTION_LINES: usize = 20;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// ASCII unit separator: splits nothing in a single-column file.
const UNIT_SEPARATOR: u8 = 0x1f;

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Quote character.
    pub quote: u8,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: b'"',
            max_rows: None,
        }
    }
}

/// Reads delimited files with a header row into column-major tables.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Read and parse a file, hashing its contents.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(Table, SourceMetadata)> {
        let path = path.as_ref();
        let contents = std::fs::read(path).map_err(|source| AssayError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let hash = format!("sha256:{:x}", Sha256::digest(&contents));
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(strip_bom(&contents), self.config.quote)?,
        };
        let table = self.parse_bytes(&contents, delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            UNIT_SEPARATOR => "single-column",
            _ => "delimited",
        };

        let metadata = SourceMetadata {
            file: path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.to_path_buf(),
            hash,
            size_bytes: contents.len() as u64,
            format: format.to_string(),
            row_count: table.row_count(),
            column_count: table.column_count(),
            loaded_at: Utc::now(),
        };

        Ok((table, metadata))
    }

    /// Parse in-memory contents with a known delimiter.
    pub fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<Table> {
        let mut reader = self.reader(strip_bom(bytes), delimiter);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(AssayError::EmptyData("No columns found".to_string()));
        }

        let limit = self.config.max_rows.unwrap_or(usize::MAX);
        let mut rows = Vec::new();
        for record in reader.records().take(limit) {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        Ok(Table::from_rows(headers, rows))
    }

    fn reader<'a>(&self, bytes: &'a [u8], delimiter: u8) -> csv::Reader<&'a [u8]> {
        csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .quote(self.config.quote)
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Pick the delimiter that splits the leading records into the widest
/// consistent shape. Quoted delimiters are ignored because the csv reader
/// does the splitting.
///
/// When no candidate splits the header, the file has one column and a
/// delimiter absent from the contents is returned, so values keep their
/// commas.
fn detect_delimiter(bytes: &[u8], quote: u8) -> Result<u8> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(AssayError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best = (b',', 0usize);
    for &delimiter in DELIMITERS {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .quote(quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let widths: Vec<usize> = reader
            .records()
            .take(DETECTION_LINES)
            .filter_map(|r| r.ok())
            .map(|r| r.len())
            .collect();
        let Some(&first) = widths.first() else {
            continue;
        };
        if first < 2 {
            continue;
        }

        let consistent = widths.iter().filter(|&&w| w == first).count();
        // Consistency dominates width.
        let score = consistent * 1000 + first;
        if score > best.1 {
            best = (delimiter, score);
        }
    }

    if best.1 == 0 {
        let unused = std::iter::once(UNIT_SEPARATOR)
            .chain(DELIMITERS.iter().copied())
            .find(|d| !bytes.contains(d));
        let Some(delimiter) = unused else {
            return Err(AssayError::EmptyData(
                "Single-column file contains every delimiter".to_string(),
            ));
        };
        tracing::debug!(delimiter, "no delimiter splits the header, reading one column");
        return Ok(delimiter);
    }

    Ok(best.0)
}
