//! CLI functionality for the EPTS tool
//!
//! This module contains all CLI-related functionality including:
//! - Composition validation
//! - Running a single calculation
//! - Evaluating a composition document
//! - Output formatting

pub mod calculate;
pub mod compose;
pub mod output;
pub mod validate;

use anyhow::Result;
use epts_model::{ParamValue, ParameterValues};

/// Parse `name=value` command-line parameters
pub fn parse_parameters(params: &[String]) -> Result<ParameterValues> {
    let mut result = ParameterValues::new();

    for param in params {
        let Some((name, value)) = param.split_once('=') else {
            anyhow::bail!("Invalid parameter format: '{}'. Expected 'name=value'", param);
        };
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Invalid parameter format: '{}'. Missing name", param);
        }
        result.insert(name.to_string(), ParamValue::parse_literal(value));
    }

    Ok(result)
}
