//! Calculate command implementation

use super::output::{self, OutputFormat};
use super::parse_parameters;
use crate::engine::ReportEngine;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use epts_model::LocationId;
use std::path::PathBuf;

/// Configuration for calculate command
pub struct CalculateConfig {
    pub data: PathBuf,
    pub metadata: PathBuf,
    pub config: Option<PathBuf>,
    pub calculation: String,
    pub now: NaiveDate,
    pub location: Option<i64>,
    pub params: Vec<String>,
    pub format: OutputFormat,
    pub output_file: Option<PathBuf>,
}

/// Run one calculation over every patient of the dataset
pub fn calculate(config: CalculateConfig) -> Result<()> {
    let params = parse_parameters(&config.params)?;
    let engine = ReportEngine::from_files(&config.data, &config.metadata, config.config.as_deref())?;
    let ctx = engine.context(config.now, config.location.map(LocationId), &params)?;
    log::debug!("calculating {} for {} patients", config.calculation, ctx.universe().len());

    let result = engine
        .calculate(&config.calculation, &params, &ctx)
        .with_context(|| format!("Calculation '{}' failed", config.calculation))?;

    let content = output::render_facts(&result, config.format)?;
    output::write_output(&content, config.output_file.as_deref())
}
