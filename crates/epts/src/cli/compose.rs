//! Compose command implementation

use super::output::{self, OutputFormat};
use super::parse_parameters;
use crate::definition::CompositionDocument;
use crate::engine::ReportEngine;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use epts_model::LocationId;
use std::path::PathBuf;

/// Configuration for compose command
pub struct ComposeConfig {
    pub data: PathBuf,
    pub metadata: PathBuf,
    pub config: Option<PathBuf>,
    pub definition: PathBuf,
    pub now: NaiveDate,
    pub location: Option<i64>,
    pub params: Vec<String>,
    pub format: OutputFormat,
    pub output_file: Option<PathBuf>,
}

/// Evaluate a composition document over every patient of the dataset
pub fn compose(config: ComposeConfig) -> Result<()> {
    let params = parse_parameters(&config.params)?;
    let document = CompositionDocument::from_json_file(&config.definition)?;
    let engine = ReportEngine::from_files(&config.data, &config.metadata, config.config.as_deref())?;
    let ctx = engine.context(config.now, config.location.map(LocationId), &params)?;
    log::debug!(
        "composing {} ({}) for {} patients",
        document.name,
        document.composition,
        ctx.universe().len()
    );

    let patients = engine
        .compose(&document, &params, &ctx)
        .with_context(|| format!("Composition '{}' failed", document.name))?;

    let content = output::render_patients(&document.name, &patients, config.format)?;
    output::write_output(&content, config.output_file.as_deref())
}
