//! CLI command implementations.

pub mod batch;
pub mod dictionary;
pub mod evaluate;
pub mod recommend;

use std::path::Path;
use std::sync::Arc;

use assay::input::ParserConfig;
use assay::{Assay, AssayConfig, DictionaryCatalog, DirectoryStore, Evaluation, FieldReport, Stores};
use colored::Colorize;

use crate::cli::EngineArgs;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub(crate) fn load_dictionary(path: Option<&Path>) -> assay::Result<DictionaryCatalog> {
    match path {
        Some(path) => DictionaryCatalog::load(path),
        None => Ok(DictionaryCatalog::builtin().clone()),
    }
}

/// Build an engine over a dataset directory.
pub(crate) fn open(
    dir: &Path,
    engine: &EngineArgs,
) -> Result<(Assay, Arc<DirectoryStore>), Box<dyn std::error::Error>> {
    if !dir.is_dir() {
        return Err(format!("Dataset directory not found: {}", dir.display()).into());
    }

    let mut config = match &engine.config {
        Some(path) => AssayConfig::load(path)?,
        None => AssayConfig::default(),
    };
    if let Some(ms) = engine.timeout_ms {
        config.runtime.store_timeout_ms = ms;
    }
    let dictionary = Arc::new(load_dictionary(engine.dictionary.as_deref())?);

    let store = Arc::new(DirectoryStore::new(dir).with_parser(ParserConfig {
        max_rows: engine.max_rows,
        ..Default::default()
    }));
    let assay = Assay::with_dictionary(Stores::shared(Arc::clone(&store)), config, dictionary)?;
    Ok((assay, store))
}

fn ratio(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

fn flag(value: bool) -> colored::ColoredString {
    if value {
        "yes".green()
    } else {
        "no".dimmed()
    }
}

/// Print an evaluation for humans.
pub(crate) fn print_evaluation(evaluation: &Evaluation, verbose: bool) {
    println!(
        "{} {}",
        "Evaluation of".cyan().bold(),
        evaluation.dataset_id.white().bold()
    );
    println!();

    println!("{}", "Fields:".yellow().bold());
    for report in &evaluation.fields {
        match report {
            FieldReport::Scored(field) => {
                let mut tags = Vec::new();
                if field.classification.is_address_feature {
                    tags.push("address".to_string());
                }
                if let Some(candidate) = &field.classification.geometry {
                    tags.push(format!("geometry:{}", candidate.label()));
                }
                if let Some(role) = field.descriptor.role {
                    tags.push(format!("role:{}", role.label()));
                }
                println!(
                    "  {:<24} {:<9} full {}  type {}  entropy {}  valid {}  adequate {}  {}",
                    field.descriptor.name.white(),
                    field.descriptor.field_type.as_str(),
                    ratio(Some(field.metrics.fullness)),
                    ratio(field.metrics.type_matching),
                    ratio(field.metrics.entropy),
                    ratio(field.metrics.validness),
                    ratio(field.metrics.adequacy),
                    tags.join(" ").cyan()
                );
                if verbose {
                    if let Some(value) = field.locality.as_ref().and_then(|l| l.value.as_deref()) {
                        println!("  {:<24} {} {}", "", "single locality:".dimmed(), value);
                    }
                }
            }
            FieldReport::Unscored { descriptor, reason } => {
                println!(
                    "  {:<24} {:<9} {} {}",
                    descriptor.name.white(),
                    descriptor.field_type.as_str(),
                    "unscored:".red(),
                    reason.label()
                );
            }
        }
    }
    println!();

    let p = &evaluation.predicates;
    println!("{}", "Predicates:".yellow().bold());
    for (name, value) in [
        ("has address features", p.has_address_features),
        ("has geometry features", p.has_geometry_features),
        ("has address", p.has_address),
        ("has geometry", p.has_geometry),
        ("connected", p.is_connected),
        ("enriched", p.is_enriched),
        ("published", p.is_published),
    ] {
        println!("  {:<24} {}", name, flag(value));
    }
    println!();

    print_recommendations(&evaluation.recommendations);

    if !evaluation.warnings.is_empty() {
        println!();
        println!("{}", "Warnings:".yellow().bold());
        for warning in &evaluation.warnings {
            println!("  {} {}", "!".yellow(), warning_line(warning));
        }
    }
}

pub(crate) fn print_recommendations(set: &assay::RecommendationSet) {
    println!("{}", "Operations:".yellow().bold());
    for (op, offered) in set.iter() {
        if offered {
            println!("  {} {}", "✓".green(), op.label().white());
        } else {
            println!("  {} {}", "·".dimmed(), op.label().dimmed());
        }
    }
}

fn warning_line(warning: &assay::EvaluationWarning) -> String {
    use assay::WarningSource;
    match &warning.source {
        WarningSource::Metadata => format!("metadata: {}", warning.message),
        WarningSource::Field { name } => format!("field '{}': {}", name, warning.message),
        WarningSource::Linkage => format!("linkage service: {}", warning.message),
        WarningSource::Catalog => format!("catalog service: {}", warning.message),
    }
}
