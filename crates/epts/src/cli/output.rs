//! Output formatting utilities

use anyhow::{Context, Result};
use colored::Colorize;
use epts_calc::FactResult;
use epts_diagnostics::EptsError;
use epts_model::PatientSet;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    #[default]
    Pretty,
    Table,
}

/// Set up color output based on user preference
pub fn setup_colors(mode: &str) {
    match mode.to_lowercase().as_str() {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        _ => colored::control::set_override(io::stdout().is_terminal()),
    }
}

/// Format an error for display, rendering EPTS diagnostics with their code
pub fn format_error(error: &anyhow::Error) -> String {
    match error.downcast_ref::<EptsError>() {
        Some(e) if error.chain().count() > 1 => {
            format!("{} {}\n{}", "Error:".red().bold(), error, format_diagnostic(e, None))
        }
        Some(e) => format_diagnostic(e, None),
        None => format!("{} {:#}", "Error:".red().bold(), error),
    }
}

/// Render an EPTS error, pointing into `source` when it has a location.
/// Collected errors are rendered one after another.
pub fn format_diagnostic(error: &EptsError, source: Option<&str>) -> String {
    error
        .errors()
        .iter()
        .map(|e| e.to_diagnostic().render(source))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_success(message: &str) -> String {
    format!("{} {}", "Success:".green().bold(), message)
}

/// Write output to a file or stdout
pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to output file: {}", path.display()))?;
        eprintln!("{}", format_success(&format!("Output written to {}", path.display())));
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn format_json(value: &Value, pretty: bool) -> Result<String> {
    if pretty {
        serde_json::to_string_pretty(value).context("Failed to serialize JSON")
    } else {
        serde_json::to_string(value).context("Failed to serialize JSON")
    }
}

#[derive(Tabled)]
struct FactRow {
    #[tabled(rename = "Patient")]
    patient: i64,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct PatientRow {
    #[tabled(rename = "Patient")]
    patient: i64,
}

/// One entry per patient
pub fn render_facts(result: &FactResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<FactRow> = result
                .iter()
                .map(|(patient, value)| FactRow {
                    patient: patient.get(),
                    value: value.to_string(),
                })
                .collect();
            Ok(Table::new(rows).with(Style::modern()).to_string())
        }
        OutputFormat::Json | OutputFormat::Pretty => {
            let value = serde_json::to_value(result).context("Failed to serialize calculation result")?;
            format_json(&value, format == OutputFormat::Pretty)
        }
    }
}

/// A patient set with its size
pub fn render_patients(name: &str, patients: &PatientSet, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<PatientRow> = patients.iter().map(|p| PatientRow { patient: p.get() }).collect();
            Ok(format!(
                "{}: {} patient(s)\n{}",
                name.cyan(),
                patients.len(),
                Table::new(rows).with(Style::modern())
            ))
        }
        OutputFormat::Json | OutputFormat::Pretty => {
            let ids: Vec<i64> = patients.iter().map(|p| p.get()).collect();
            let value = json!({ "name": name, "size": ids.len(), "patients": ids });
            format_json(&value, format == OutputFormat::Pretty)
        }
    }
}
