//! Report engine
//!
//! Bundles the observation store with the calculation registry wired to it
//! and builds per-run contexts.

use crate::definition::CompositionDocument;
use chrono::NaiveDate;
use epts_calc::{CalculationContext, CalculationRegistry, CalculatorConfig, FactResult};
use epts_composition::CohortDefinition;
use epts_diagnostics::Result;
use epts_model::{HivMetadata, InMemoryStore, LocationId, MetadataDictionary, ObservationStore, ParameterValues, PatientSet};
use std::path::Path;
use std::sync::Arc;

pub struct ReportEngine {
    store: Arc<dyn ObservationStore>,
    registry: CalculationRegistry,
}

impl ReportEngine {
    pub fn new(store: Arc<dyn ObservationStore>, metadata: Arc<HivMetadata>, config: &CalculatorConfig) -> Self {
        let registry = CalculationRegistry::standard(store.clone(), metadata, config);
        Self { store, registry }
    }

    /// Load a JSON dataset, a JSON metadata dictionary and an optional
    /// calculator configuration
    pub fn from_files(data: &Path, metadata: &Path, config: Option<&Path>) -> Result<Self> {
        let store = InMemoryStore::from_json_file(data)?;
        let dictionary = MetadataDictionary::from_json_file(metadata)?;
        let metadata = HivMetadata::from_dictionary(&dictionary)?;
        let config = match config {
            Some(path) => CalculatorConfig::from_json_file(path)?,
            None => CalculatorConfig::default(),
        };
        Ok(Self::new(Arc::new(store), Arc::new(metadata), &config))
    }

    pub fn registry(&self) -> &CalculationRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn ObservationStore> {
        &self.store
    }

    /// A context over every patient in the store, with `ambient` values and
    /// the location cached for the run
    pub fn context(
        &self,
        now: NaiveDate,
        location: Option<LocationId>,
        ambient: &ParameterValues,
    ) -> Result<CalculationContext> {
        let mut builder = CalculationContext::builder(now).universe(self.store.all_patients()?);
        if let Some(location) = location {
            builder = builder.location(location);
        }
        for (name, value) in ambient {
            builder = builder.cache(name.clone(), value.clone());
        }
        Ok(builder.build())
    }

    /// Run one calculation over the context universe
    pub fn calculate(&self, name: &str, params: &ParameterValues, ctx: &CalculationContext) -> Result<FactResult> {
        let calculation = self.registry.get(name)?;
        let result = calculation.evaluate(ctx.universe(), params, ctx)?;
        log::info!(
            "{}: {} of {} patients pass",
            name,
            result.patients_that_pass().len(),
            result.len()
        );
        Ok(result)
    }

    /// Build and evaluate a composition document
    pub fn compose(
        &self,
        document: &CompositionDocument,
        params: &ParameterValues,
        ctx: &CalculationContext,
    ) -> Result<PatientSet> {
        let definition = document.build(&self.registry, &self.store)?;
        let found = definition.evaluate(params, ctx)?;
        log::info!("{}: {} of {} patients", document.name, found.len(), ctx.universe().len());
        Ok(found)
    }
}
