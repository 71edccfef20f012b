//! Evaluate command - profile one dataset and list offered operations.

use std::path::PathBuf;
use std::time::Duration;

use assay::EvaluationOptions;
use colored::Colorize;

use super::{open, print_evaluation, CommandResult};
use crate::cli::EngineArgs;

pub async fn run(dir: PathBuf, dataset: String, engine: EngineArgs, verbose: bool) -> CommandResult {
    let (assay, store) = open(&dir, &engine)?;

    let mut options = EvaluationOptions::default();
    if let Some(ms) = engine.timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms));
    }

    let evaluation = assay.evaluate_with(&dataset, &options).await?;

    if engine.json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        print_evaluation(&evaluation, verbose);
        if verbose {
            // The table is cached by now; this only reads its stamp.
            let source = store.source(&dataset).await?;
            println!();
            println!("{}", "Source:".yellow().bold());
            println!("  {} ({}, {} bytes)", source.path.display(), source.format, source.size_bytes);
            println!("  {} rows x {} columns", source.row_count, source.column_count);
            println!("  {}", source.hash.dimmed());
        }
    }
    Ok(())
}
