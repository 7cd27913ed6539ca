//! Calculation registry
//!
//! Maps calculation names to their implementations. The orchestrator builds
//! one registry per run with explicit collaborators; calculations that depend
//! on other calculations receive them at construction.

use crate::calculation::{CalculationRef, PatientCalculation};
use crate::calculations::{
    AliveCalculation, CompletedIptCalculation, InitialArtStartDateCalculation, OnArtForMonthsCalculation,
    PregnantDateCalculation, RoutineViralLoadCalculation, ViralLoadResultsCalculation,
};
use crate::config::CalculatorConfig;
use epts_diagnostics::{EptsError, Result, EPTS0105};
use epts_model::{HivMetadata, ObservationStore};
use indexmap::IndexMap;
use std::sync::Arc;

/// Registry of calculations by name
#[derive(Default, Clone)]
pub struct CalculationRegistry {
    calculations: IndexMap<String, CalculationRef>,
}

impl CalculationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every standard calculation wired to `store`
    pub fn standard(
        store: Arc<dyn ObservationStore>,
        metadata: Arc<HivMetadata>,
        config: &CalculatorConfig,
    ) -> Self {
        let art_start: CalculationRef = Arc::new(InitialArtStartDateCalculation::new(store.clone(), metadata.clone()));

        let mut registry = Self::new();
        registry.register(art_start.clone());
        registry.register(Arc::new(CompletedIptCalculation::new(
            store.clone(),
            metadata.clone(),
            config.completed_ipt.clone(),
        )));
        registry.register(Arc::new(PregnantDateCalculation::new(
            store.clone(),
            metadata.clone(),
            config.pregnancy_date.clone(),
        )));
        registry.register(Arc::new(RoutineViralLoadCalculation::new(
            store.clone(),
            metadata.clone(),
            art_start.clone(),
            config.routine_viral_load.clone(),
        )));
        registry.register(Arc::new(OnArtForMonthsCalculation::new(
            store.clone(),
            metadata.clone(),
            art_start,
            config.on_art_for_months.clone(),
        )));
        registry.register(Arc::new(ViralLoadResultsCalculation::new(
            store.clone(),
            metadata,
            config.viral_load_results.clone(),
        )));
        registry.register(Arc::new(AliveCalculation::new(store)));
        registry
    }

    /// Register a calculation under its own name, replacing any previous one
    pub fn register(&mut self, calculation: CalculationRef) {
        self.calculations.insert(calculation.name().to_string(), calculation);
    }

    pub fn get(&self, name: &str) -> Result<CalculationRef> {
        self.calculations.get(name).cloned().ok_or_else(|| {
            EptsError::configuration(EPTS0105, format!("Unknown calculation '{}'", name))
                .with_context(format!("known calculations: {}", self.names().join(", ")))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.calculations.contains_key(name)
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.calculations.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn PatientCalculation> {
        self.calculations.values().map(|c| c.as_ref())
    }
}

impl std::fmt::Debug for CalculationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalculationRegistry")
            .field("calculations", &self.names())
            .finish()
    }
}
