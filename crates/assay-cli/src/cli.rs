//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Assay: field profiling and capability recommendation
#[derive(Parser)]
#[command(name = "assay")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Options shared by the commands that evaluate datasets.
#[derive(Args, Clone, Debug)]
pub struct EngineArgs {
    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON dictionary file (default: built-in dictionary)
    #[arg(short, long)]
    pub dictionary: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Bound on each store read, in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Read at most this many rows of each data file
    #[arg(long, value_name = "N")]
    pub max_rows: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate one dataset and list the offered operations
    Evaluate {
        /// Directory holding <dataset>.csv and optional sidecar files
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Dataset id (file stem inside DIR)
        #[arg(value_name = "DATASET")]
        dataset: String,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Evaluate every dataset in a directory
    Batch {
        /// Directory holding the datasets
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Map a predicates file onto offered operations
    Recommend {
        /// JSON file with the seven dataset predicates
        #[arg(value_name = "PREDICATES_JSON")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective dictionary as JSON
    Dictionary {
        /// JSON dictionary file (default: built-in dictionary)
        #[arg(short, long)]
        dictionary: Option<PathBuf>,
    },
}
