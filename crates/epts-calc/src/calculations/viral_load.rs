//! Viral load results in a lookback window

use crate::calculation::{FactKind, PatientCalculation};
use crate::common::all_obs;
use crate::config::ViralLoadResultsConfig;
use crate::context::CalculationContext;
use crate::result::{FactResult, FactValue};
use crate::temporal::add_months;
use epts_diagnostics::Result;
use epts_model::{HivMetadata, ObsQuery, ObservationStore, ParameterValues, PatientSet};
use std::sync::Arc;

/// Every viral load result at the report location from `lookback_months`
/// before "now" up to "now", chronological. Patients without results get an
/// empty list.
pub struct ViralLoadResultsCalculation {
    store: Arc<dyn ObservationStore>,
    metadata: Arc<HivMetadata>,
    config: ViralLoadResultsConfig,
}

impl ViralLoadResultsCalculation {
    pub const NAME: &'static str = "viralLoadResults";

    pub fn new(store: Arc<dyn ObservationStore>, metadata: Arc<HivMetadata>, config: ViralLoadResultsConfig) -> Self {
        Self { store, metadata, config }
    }
}

impl PatientCalculation for ViralLoadResultsCalculation {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> FactKind {
        FactKind::Observations
    }

    fn evaluate(&self, cohort: &PatientSet, _params: &ParameterValues, ctx: &CalculationContext) -> Result<FactResult> {
        let location = ctx.location()?;
        let now = ctx.now();
        let results = all_obs(
            self.store.as_ref(),
            &ObsQuery::new(self.metadata.hiv_viral_load)
                .location(location)
                .on_or_after(add_months(now, -self.config.lookback_months))
                .on_or_before(now),
            cohort,
        )?;

        let mut result = FactResult::for_cohort(cohort, FactValue::Observations(Vec::new()));
        for (patient, observations) in results {
            result.insert(patient, FactValue::Observations(observations));
        }
        Ok(result)
    }
}
