//! Validate command implementation

use super::output;
use anyhow::Result;
use colored::Colorize;
use epts_composition::{parse_composition, Mapping};
use epts_diagnostics::EptsError;

/// Configuration for validate command
pub struct ValidateConfig {
    pub compositions: Vec<String>,
    pub mappings: Vec<String>,
    pub verbose: bool,
}

/// What went wrong with one input, if anything
struct ValidationResult<'a> {
    source: &'a str,
    kind: &'static str,
    error: Option<EptsError>,
    rendered: Option<String>,
}

/// Validate composition strings and parameter mappings
pub fn validate(config: ValidateConfig) -> Result<()> {
    if config.compositions.is_empty() && config.mappings.is_empty() {
        anyhow::bail!("Nothing to validate: pass composition strings or --mapping values");
    }

    let mut results = Vec::new();
    for source in &config.compositions {
        let parsed = parse_composition(source);
        results.push(ValidationResult {
            source,
            kind: "composition",
            rendered: parsed.as_ref().ok().map(ToString::to_string),
            error: parsed.err(),
        });
    }
    for source in &config.mappings {
        let parsed = Mapping::parse(source);
        results.push(ValidationResult {
            source,
            kind: "mapping",
            rendered: parsed.as_ref().ok().map(ToString::to_string),
            error: parsed.err(),
        });
    }

    for result in &results {
        print_validation_result(result, config.verbose);
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    println!();
    if failed == 0 {
        println!(
            "{}",
            output::format_success(&format!("All {} input(s) validated successfully", results.len()))
        );
        Ok(())
    } else {
        anyhow::bail!("{} of {} input(s) are invalid", failed, results.len())
    }
}

fn print_validation_result(result: &ValidationResult<'_>, verbose: bool) {
    match &result.error {
        None => {
            println!("{} {} {}", "✓".green().bold(), result.kind, result.source.cyan());
            if let (true, Some(rendered)) = (verbose, &result.rendered) {
                println!("  = {}", rendered);
            }
        }
        Some(error) => {
            println!("{} {} {}", "✗".red().bold(), result.kind, result.source.cyan());
            for line in output::format_diagnostic(error, Some(result.source)).lines() {
                println!("  {}", line);
            }
        }
    }
}
