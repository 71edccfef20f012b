//! Batch command - evaluate every dataset in a directory.

use std::path::PathBuf;

use colored::Colorize;

use super::{open, print_evaluation, CommandResult};
use crate::cli::EngineArgs;

pub async fn run(dir: PathBuf, engine: EngineArgs, verbose: bool) -> CommandResult {
    let (assay, store) = open(&dir, &engine)?;

    let ids = store.dataset_ids()?;
    if ids.is_empty() {
        println!(
            "{} No datasets found in {}",
            "Note:".yellow(),
            dir.display()
        );
        return Ok(());
    }

    let results = assay.evaluate_many(ids).await;
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();

    if engine.json {
        let entries: Vec<serde_json::Value> = results
            .iter()
            .map(|(id, result)| match result {
                Ok(evaluation) => serde_json::json!({ "dataset_id": id, "evaluation": evaluation }),
                Err(e) => serde_json::json!({ "dataset_id": id, "error": e.to_string() }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for (id, result) in &results {
            match result {
                Ok(evaluation) => print_evaluation(evaluation, verbose),
                Err(e) => println!("{} {}: {}", "Failed:".red().bold(), id, e),
            }
            println!();
        }
        println!(
            "{} {} dataset(s), {} failed",
            "Done:".green().bold(),
            results.len().to_string().white().bold(),
            failed
        );
    }
    Ok(())
}
