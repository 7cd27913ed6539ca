//! Calculation context
//!
//! One context is created per report run by the orchestrator and discarded
//! at the end of the run. It carries the reference date ("now"), the universe
//! of patients known to the run, and a cache of ambient parameters such as
//! `location`, `startDate` and `endDate`. The cache is filled through the
//! builder before any calculation runs and is read-only afterwards.

use chrono::NaiveDate;
use epts_diagnostics::{EptsError, Result, EPTS0100, EPTS0103};
use epts_model::{LocationId, ParamValue, ParameterValues, PatientSet};
use std::collections::HashMap;

/// Ambient key under which the report location is cached
pub const LOCATION: &str = "location";

/// Immutable per-run evaluation context
#[derive(Debug, Clone)]
pub struct CalculationContext {
    now: NaiveDate,
    universe: PatientSet,
    cache: HashMap<String, ParamValue>,
}

impl CalculationContext {
    pub fn builder(now: NaiveDate) -> CalculationContextBuilder {
        CalculationContextBuilder::new(now)
    }

    /// Reference date of the run
    pub fn now(&self) -> NaiveDate {
        self.now
    }

    /// All patients known to the run
    pub fn universe(&self) -> &PatientSet {
        &self.universe
    }

    pub fn get_from_cache(&self, name: &str) -> Option<&ParamValue> {
        self.cache.get(name)
    }

    /// The report location; required by most calculations
    pub fn location(&self) -> Result<LocationId> {
        let value = self.get_from_cache(LOCATION).ok_or_else(|| missing(LOCATION))?;
        value.as_location().ok_or_else(|| mismatch(LOCATION, "Location", value))
    }

    /// Look a parameter up in the explicit values first, then in the
    /// ambient cache. `None` when neither has it.
    pub fn parameter<'a>(&'a self, params: &'a ParameterValues, name: &str) -> Option<&'a ParamValue> {
        params.get(name).or_else(|| self.cache.get(name))
    }

    /// A date parameter that must be present
    pub fn date_parameter(&self, params: &ParameterValues, name: &str) -> Result<NaiveDate> {
        let value = self.parameter(params, name).ok_or_else(|| missing(name))?;
        value.as_date().ok_or_else(|| mismatch(name, "Date", value))
    }

    /// A date parameter that may be absent; absence leaves a window open
    pub fn optional_date_parameter(&self, params: &ParameterValues, name: &str) -> Result<Option<NaiveDate>> {
        match self.parameter(params, name) {
            None => Ok(None),
            Some(value) => value
                .as_date()
                .map(Some)
                .ok_or_else(|| mismatch(name, "Date", value)),
        }
    }

    /// An optional integer parameter
    pub fn integer_parameter(&self, params: &ParameterValues, name: &str) -> Result<Option<i64>> {
        match self.parameter(params, name) {
            None => Ok(None),
            Some(value) => value
                .as_integer()
                .map(Some)
                .ok_or_else(|| mismatch(name, "Integer", value)),
        }
    }
}

fn missing(name: &str) -> EptsError {
    EptsError::configuration(EPTS0100, format!("Missing required parameter '{}'", name))
}

fn mismatch(name: &str, expected: &str, found: &ParamValue) -> EptsError {
    EptsError::configuration(
        EPTS0103,
        format!(
            "Parameter '{}' should be a {} but was a {}",
            name,
            expected,
            found.type_name()
        ),
    )
}

/// Builder for [`CalculationContext`]
#[derive(Debug, Clone)]
pub struct CalculationContextBuilder {
    now: NaiveDate,
    universe: PatientSet,
    cache: HashMap<String, ParamValue>,
}

impl CalculationContextBuilder {
    pub fn new(now: NaiveDate) -> Self {
        Self {
            now,
            universe: PatientSet::new(),
            cache: HashMap::new(),
        }
    }

    pub fn universe(mut self, universe: PatientSet) -> Self {
        self.universe = universe;
        self
    }

    pub fn location(self, location: LocationId) -> Self {
        self.cache(LOCATION, ParamValue::from(location))
    }

    /// Cache an ambient value for the duration of the run
    pub fn cache(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.cache.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> CalculationContext {
        CalculationContext {
            now: self.now,
            universe: self.universe,
            cache: self.cache,
        }
    }
}
