//! JSON cohort definition documents
//!
//! A composition and its searches can be described in JSON and turned into
//! a [`CompositionCohortDefinition`]:
//!
//! ```json
//! {
//!   "name": "txNew",
//!   "composition": "startedArt NOT (transferredIn OR women)",
//!   "parameters": [{ "name": "endDate", "kind": "date" }],
//!   "searches": {
//!     "startedArt": { "calculation": { "name": "onArtForMoreThanXMonths" }, "mapping": "months=3" },
//!     "transferredIn": { "patients": [12, 40] },
//!     "women": { "gender": "F" }
//!   }
//! }
//! ```
//!
//! A search is backed by exactly one of `calculation`, `gender`,
//! `patients` or a nested `composition` document.

use epts_calc::CalculationRegistry;
use epts_composition::{
    CalculationCohortDefinition, CohortRef, CompositionCohortDefinition, GenderCohortDefinition, Parameter,
    StaticCohortDefinition,
};
use epts_diagnostics::{EptsError, Result, EPTS0401, EPTS0402};
use epts_model::{Gender, ObservationStore, PatientId};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// A composition with its registered searches
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionDocument {
    pub name: String,
    pub composition: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub searches: IndexMap<String, SearchDocument>,
}

/// One named search of a composition
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchDocument {
    #[serde(flatten)]
    pub source: SearchSource,
    #[serde(default)]
    pub mapping: String,
}

/// What a search evaluates
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchSource {
    /// A registered calculation, by name; `parameters` lists what its
    /// mapping must bind
    Calculation {
        name: String,
        #[serde(default)]
        parameters: Vec<Parameter>,
    },
    Gender(Gender),
    Patients(Vec<PatientId>),
    Composition(Box<CompositionDocument>),
}

impl CompositionDocument {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| EptsError::system(EPTS0402, format!("Invalid cohort definition: {}", e)))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| EptsError::system(EPTS0401, format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Build the cohort definition, resolving calculations in `registry`.
    ///
    /// Registration and mapping coverage are validated here, so a built
    /// definition only fails at evaluation for missing parameter values or
    /// store failures.
    pub fn build(
        &self,
        registry: &CalculationRegistry,
        store: &Arc<dyn ObservationStore>,
    ) -> Result<CompositionCohortDefinition> {
        let mut definition = CompositionCohortDefinition::new(&self.name, &self.composition)?;
        for parameter in &self.parameters {
            definition.add_parameter(parameter.clone());
        }
        for (name, search) in &self.searches {
            let cohort = search.source.build(name, registry, store)?;
            definition.add_search(name, cohort, &search.mapping)?;
        }
        definition.validate()?;
        Ok(definition)
    }
}

impl SearchSource {
    fn build(&self, name: &str, registry: &CalculationRegistry, store: &Arc<dyn ObservationStore>) -> Result<CohortRef> {
        let cohort: CohortRef = match self {
            Self::Calculation { name: calculation, parameters } => {
                let mut cohort = CalculationCohortDefinition::new(name, registry.get(calculation)?);
                for parameter in parameters {
                    cohort = cohort.with_parameter(parameter.clone());
                }
                Arc::new(cohort)
            }
            Self::Gender(gender) => Arc::new(GenderCohortDefinition::new(name, *gender, store.clone())),
            Self::Patients(patients) => Arc::new(StaticCohortDefinition::new(name, patients.iter().copied().collect())),
            Self::Composition(document) => Arc::new(document.build(registry, store)?),
        };
        Ok(cohort)
    }
}
