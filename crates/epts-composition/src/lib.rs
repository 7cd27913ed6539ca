//! EPTS cohort composition algebra
//!
//! Combines named cohorts through boolean expressions such as
//! `startedArt NOT (transferredIn OR restartedTreatment)`, binding the
//! report-wide parameters of the composition to the parameters each named
//! cohort declares.
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use epts_calc::CalculationContext;
//! use epts_composition::{compose, MappedSearch, Mapping, Searches, StaticCohortDefinition};
//! use epts_model::{patient_set, ParameterValues};
//! use std::sync::Arc;
//!
//! let fixed = |ids: &[i64]| {
//!     MappedSearch::new(
//!         Arc::new(StaticCohortDefinition::new("fixed", patient_set(ids.iter().copied()))),
//!         Mapping::new(),
//!     )
//! };
//! let mut searches = Searches::new();
//! searches.insert("A".into(), fixed(&[1, 2, 3]));
//! searches.insert("B".into(), fixed(&[2]));
//!
//! let ctx = CalculationContext::builder(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap())
//!     .universe(patient_set(1..=4))
//!     .build();
//! let found = compose("A AND NOT B", &searches, &ParameterValues::new(), &ctx).unwrap();
//! assert_eq!(found, patient_set([1, 3]));
//! ```

pub mod ast;
pub mod cohort;
pub mod evaluator;
pub mod mapping;
pub mod parser;

pub use ast::CompositionExpr;
pub use cohort::{
    check_parameters, CalculationCohortDefinition, CohortDefinition, CohortRef, GenderCohortDefinition, Parameter,
    ParameterKind, StaticCohortDefinition,
};
pub use evaluator::{compose, compose_parsed, validate, CompositionCohortDefinition, MappedSearch, Searches};
pub use mapping::{DateOffset, MappedValue, Mapping, OffsetUnit};
pub use parser::parse_composition;
