//! On ART for more than a number of months
//!
//! True when the patient started ART and the last viral load result was taken
//! at least `minimum_months` whole months after the start. A result taken
//! before ART started never qualifies.

use crate::calculation::{CalculationRef, FactKind, PatientCalculation};
use crate::common::last_obs;
use crate::config::OnArtForMonthsConfig;
use crate::context::CalculationContext;
use crate::result::{FactResult, FactValue};
use crate::temporal::months_between;
use epts_diagnostics::{EptsError, Result, EPTS0103};
use epts_model::{HivMetadata, ObsQuery, ObservationStore, ParameterValues, PatientSet};
use std::sync::Arc;

/// Overrides the configured month count for one evaluation
pub const MONTHS: &str = "months";

pub struct OnArtForMonthsCalculation {
    store: Arc<dyn ObservationStore>,
    metadata: Arc<HivMetadata>,
    art_start: CalculationRef,
    config: OnArtForMonthsConfig,
}

impl OnArtForMonthsCalculation {
    pub const NAME: &'static str = "onArtForMoreThanXMonths";

    pub fn new(
        store: Arc<dyn ObservationStore>,
        metadata: Arc<HivMetadata>,
        art_start: CalculationRef,
        config: OnArtForMonthsConfig,
    ) -> Self {
        Self {
            store,
            metadata,
            art_start,
            config,
        }
    }
}

impl PatientCalculation for OnArtForMonthsCalculation {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> FactKind {
        FactKind::Boolean
    }

    fn evaluate(&self, cohort: &PatientSet, params: &ParameterValues, ctx: &CalculationContext) -> Result<FactResult> {
        let location = ctx.location()?;
        let minimum = match ctx.integer_parameter(params, MONTHS)? {
            Some(months) => i32::try_from(months).map_err(|_| {
                EptsError::configuration(EPTS0103, format!("Parameter '{}' is out of range: {}", MONTHS, months))
            })?,
            None => self.config.minimum_months,
        };

        let art_starts = self.art_start.evaluate(cohort, params, ctx)?;
        let last_vl = last_obs(
            self.store.as_ref(),
            &ObsQuery::new(self.metadata.hiv_viral_load)
                .location(location)
                .on_or_before(ctx.now()),
            cohort,
        )?;

        let mut result = FactResult::for_cohort(cohort, FactValue::Boolean(false));
        for patient in cohort {
            let vl_date = last_vl.get(patient).and_then(Option::as_ref).map(|o| o.obs_date);
            if let (Some(start), Some(vl_date)) = (art_starts.date(*patient), vl_date) {
                let on_art = months_between(start, vl_date) >= minimum;
                result.insert(*patient, FactValue::Boolean(on_art));
            }
        }
        Ok(result)
    }
}
