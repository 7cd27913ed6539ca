//! EPTS HIV care cohort calculations
//!
//! This crate ties the workspace together:
//! - Temporal fact calculations over an observation store (`calc`)
//! - The cohort composition algebra (`composition`)
//! - JSON cohort definition documents and a report engine
//! - The `epts` command-line tool
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use epts::{CompositionDocument, ReportEngine};
//! use epts::model::{LocationId, ParameterValues};
//! use std::path::Path;
//!
//! # fn main() -> epts::Result<()> {
//! let engine = ReportEngine::from_files(Path::new("dataset.json"), Path::new("metadata.json"), None)?;
//! let ctx = engine.context(NaiveDate::from_ymd_opt(2021, 1, 20).unwrap(), Some(LocationId(1)), &ParameterValues::new())?;
//! let document = CompositionDocument::from_json_file("tx_new.json")?;
//! let patients = engine.compose(&document, &ParameterValues::new(), &ctx)?;
//! println!("{} patients", patients.len());
//! # Ok(())
//! # }
//! ```

pub use epts_calc as calc;
pub use epts_composition as composition;
pub use epts_diagnostics as diagnostics;
pub use epts_model as model;

pub mod definition;
pub mod engine;

pub use definition::{CompositionDocument, SearchDocument, SearchSource};
pub use engine::ReportEngine;
pub use epts_calc::{CalculationContext, FactResult, FactValue, PatientCalculation};
pub use epts_composition::{compose, parse_composition, CohortDefinition, CompositionCohortDefinition};
pub use epts_diagnostics::{EptsError, Result};

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
