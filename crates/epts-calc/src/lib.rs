//! EPTS temporal fact calculations
//!
//! This crate provides:
//! - The immutable per-run `CalculationContext`
//! - The `PatientCalculation` contract and its `FactResult`
//! - Calendar arithmetic and shared store utilities
//! - The HIV care calculators and a registry wiring them together
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use epts_calc::{CalculationContext, CalculationRegistry, CalculatorConfig};
//! use epts_model::{HivMetadata, InMemoryStore, LocationId, MetadataDictionary, ObservationStore, ParameterValues};
//!
//! # fn main() -> epts_diagnostics::Result<()> {
//! let store = Arc::new(InMemoryStore::from_json_file("dataset.json")?);
//! let metadata = HivMetadata::from_dictionary(&MetadataDictionary::from_json_file("metadata.json")?)?;
//! let registry = CalculationRegistry::standard(store.clone(), Arc::new(metadata), &CalculatorConfig::default());
//!
//! let cohort = store.all_patients()?;
//! let ctx = CalculationContext::builder(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap())
//!     .universe(cohort.clone())
//!     .location(LocationId(1))
//!     .build();
//! let result = registry.get("routineViralLoad")?.evaluate(&cohort, &ParameterValues::new(), &ctx)?;
//! println!("{} patients on routine monitoring", result.patients_that_pass().len());
//! # Ok(())
//! # }
//! ```

pub mod calculation;
pub mod calculations;
pub mod common;
pub mod config;
pub mod context;
pub mod registry;
pub mod result;
pub mod temporal;

pub use calculation::{CalculationRef, FactKind, PatientCalculation};
pub use config::*;
pub use context::{CalculationContext, CalculationContextBuilder};
pub use registry::CalculationRegistry;
pub use result::{FactResult, FactValue};
