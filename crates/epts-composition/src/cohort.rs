//! Cohort definitions
//!
//! A cohort definition turns bound parameters into a set of patients. The
//! composition evaluator only sees this trait, so calculation-backed,
//! demographic, fixed and composed cohorts can be mixed freely.

use epts_calc::common::of_gender;
use epts_calc::{CalculationContext, CalculationRef};
use epts_diagnostics::{EptsError, Result, EPTS0103};
use epts_model::{Gender, ObservationStore, ParamValue, ParameterValues, PatientSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Expected type of a declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterKind {
    Date,
    Integer,
    Boolean,
    Location,
    Text,
}

impl ParameterKind {
    pub fn accepts(self, value: &ParamValue) -> bool {
        match self {
            Self::Date => value.as_date().is_some(),
            Self::Integer => value.as_integer().is_some(),
            Self::Boolean => matches!(value, ParamValue::Boolean(_)),
            Self::Location => value.as_locations().is_some(),
            Self::Text => matches!(value, ParamValue::Text(_)),
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Date => "Date",
            Self::Integer => "Integer",
            Self::Boolean => "Boolean",
            Self::Location => "Location",
            Self::Text => "Text",
        };
        f.write_str(name)
    }
}

/// A parameter a cohort definition declares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            label: None,
            kind,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A named provider of a patient set
pub trait CohortDefinition: Send + Sync {
    fn name(&self) -> &str;

    /// Parameters every use of this definition must bind
    fn parameters(&self) -> &[Parameter];

    /// Configuration errors `evaluate` would raise for these parameters,
    /// found without touching the store
    fn check(&self, params: &ParameterValues, _ctx: &CalculationContext) -> Result<()> {
        check_parameters(self.name(), self.parameters(), params)
    }

    /// Patients of the context universe matching the definition
    fn evaluate(&self, params: &ParameterValues, ctx: &CalculationContext) -> Result<PatientSet>;
}

/// Shared handle to a cohort definition
pub type CohortRef = Arc<dyn CohortDefinition>;

/// Check the type of every declared parameter that has a value
pub fn check_parameters(owner: &str, declared: &[Parameter], params: &ParameterValues) -> Result<()> {
    for parameter in declared {
        let Some(value) = params.get(&parameter.name) else {
            continue;
        };
        if !parameter.kind.accepts(value) {
            return Err(EptsError::configuration(
                EPTS0103,
                format!(
                    "Parameter '{}' of '{}' should be a {} but was a {}",
                    parameter.name,
                    owner,
                    parameter.kind,
                    value.type_name()
                ),
            ));
        }
    }
    Ok(())
}

/// Patients for whom a calculation passes
pub struct CalculationCohortDefinition {
    name: String,
    calculation: CalculationRef,
    parameters: Vec<Parameter>,
}

impl CalculationCohortDefinition {
    pub fn new(name: impl Into<String>, calculation: CalculationRef) -> Self {
        Self {
            name: name.into(),
            calculation,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

impl CohortDefinition for CalculationCohortDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn evaluate(&self, params: &ParameterValues, ctx: &CalculationContext) -> Result<PatientSet> {
        check_parameters(&self.name, &self.parameters, params)?;
        let result = self.calculation.evaluate(ctx.universe(), params, ctx)?;
        let passing = result.patients_that_pass();
        log::debug!(
            "cohort '{}' via {}: {} of {} patients",
            self.name,
            self.calculation.name(),
            passing.len(),
            ctx.universe().len()
        );
        Ok(passing)
    }
}

/// Patients of one gender
pub struct GenderCohortDefinition {
    name: String,
    gender: Gender,
    store: Arc<dyn ObservationStore>,
}

impl GenderCohortDefinition {
    pub fn new(name: impl Into<String>, gender: Gender, store: Arc<dyn ObservationStore>) -> Self {
        Self {
            name: name.into(),
            gender,
            store,
        }
    }
}

impl CohortDefinition for GenderCohortDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> &[Parameter] {
        &[]
    }

    fn evaluate(&self, _params: &ParameterValues, ctx: &CalculationContext) -> Result<PatientSet> {
        of_gender(self.store.as_ref(), ctx.universe(), self.gender)
    }
}

/// A fixed, previously computed set of patients
#[derive(Debug, Clone)]
pub struct StaticCohortDefinition {
    name: String,
    patients: PatientSet,
}

impl StaticCohortDefinition {
    pub fn new(name: impl Into<String>, patients: PatientSet) -> Self {
        Self {
            name: name.into(),
            patients,
        }
    }
}

impl CohortDefinition for StaticCohortDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> &[Parameter] {
        &[]
    }

    fn evaluate(&self, _params: &ParameterValues, ctx: &CalculationContext) -> Result<PatientSet> {
        Ok(self.patients.intersection(ctx.universe()).copied().collect())
    }
}
