//! Recommend command - run the decision table on given predicates.

use std::path::PathBuf;

use assay::{DatasetPredicates, RecommendationEngine};

use super::{print_recommendations, CommandResult};

pub fn run(file: PathBuf, json: bool) -> CommandResult {
    let text = std::fs::read_to_string(&file)
        .map_err(|e| format!("Cannot read predicates file {}: {}", file.display(), e))?;
    let predicates: DatasetPredicates = serde_json::from_str(&text)?;

    let set = RecommendationEngine::recommend(&predicates);
    if json {
        println!("{}", serde_json::to_string_pretty(&set)?);
    } else {
        print_recommendations(&set);
    }
    Ok(())
}
