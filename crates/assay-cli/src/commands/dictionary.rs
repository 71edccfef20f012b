//! Dictionary command - print the effective vocabulary.

use std::path::PathBuf;

use super::{load_dictionary, CommandResult};

pub fn run(dictionary: Option<PathBuf>) -> CommandResult {
    let catalog = load_dictionary(dictionary.as_deref())?;
    println!("{}", serde_json::to_string_pretty(catalog.lists())?);
    Ok(())
}
