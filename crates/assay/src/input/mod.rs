//! Raw values, samples, and delimited-file input.

mod parser;
mod sample;
mod source;

pub use parser::{Parser, ParserConfig};
pub use sample::{field_seed, FieldSample, RawValue, SamplingConfig};
pub use source::{SourceMetadata, Table};
