//! Calculator thresholds
//!
//! Every threshold a calculator relies on lives in a configuration struct
//! handed to the calculator at construction. Defaults carry the values of
//! the national indicator guidelines; a JSON file can override any subset.

use epts_diagnostics::{EptsError, Result, EPTS0401, EPTS0402};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Completed isoniazid prophylaxis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompletedIptConfig {
    /// Minimum days between start and completion
    pub minimum_duration_days: i64,
    /// Months after the start date in which usage is counted
    pub usage_window_months: i32,
    /// Usage observations required when no completion date exists
    pub minimum_usage_count: usize,
}

impl Default for CompletedIptConfig {
    fn default() -> Self {
        Self {
            minimum_duration_days: 180,
            usage_window_months: 7,
            minimum_usage_count: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PregnancyDateConfig {
    /// How far back from "now" the index lab result is searched
    pub index_lookback_months: i32,
    /// Evidence window ending at the index event
    pub evidence_window_months: i32,
}

impl Default for PregnancyDateConfig {
    fn default() -> Self {
        Self {
            index_lookback_months: 12,
            evidence_window_months: 9,
        }
    }
}

/// Routine viral load monitoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoutineViralLoadConfig {
    pub window_months: i32,
    /// Single-result criterion: result after this many months on ART...
    pub first_result_after_months: i32,
    /// ...and no later than this many
    pub first_result_until_months: i32,
    /// Suppression threshold for the previous result, copies/ml
    pub suppressed_below: f64,
    pub repeat_min_months: i32,
    pub repeat_max_months: i32,
}

impl Default for RoutineViralLoadConfig {
    fn default() -> Self {
        Self {
            window_months: 12,
            first_result_after_months: 6,
            first_result_until_months: 9,
            suppressed_below: 1000.0,
            repeat_min_months: 12,
            repeat_max_months: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OnArtForMonthsConfig {
    pub minimum_months: i32,
}

impl Default for OnArtForMonthsConfig {
    fn default() -> Self {
        Self { minimum_months: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViralLoadResultsConfig {
    /// Months before "now" covered by the result list
    pub lookback_months: i32,
}

impl Default for ViralLoadResultsConfig {
    fn default() -> Self {
        Self { lookback_months: 12 }
    }
}

/// Configuration for every standard calculator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalculatorConfig {
    pub completed_ipt: CompletedIptConfig,
    pub pregnancy_date: PregnancyDateConfig,
    pub routine_viral_load: RoutineViralLoadConfig,
    pub on_art_for_months: OnArtForMonthsConfig,
    pub viral_load_results: ViralLoadResultsConfig,
}

impl CalculatorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| EptsError::system(EPTS0402, format!("Invalid calculator configuration: {}", e)))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            EptsError::system(EPTS0401, format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }
}
