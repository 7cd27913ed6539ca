//! Most recent pregnancy evidence before the last viral load result
//!
//! For each female patient the index event is the last viral load result at
//! the report location in the twelve months before "now". Four classes of
//! pregnancy evidence are gathered and any of them falling in the nine months
//! up to and including the index event counts:
//!
//! - a "pregnant" observation answered with gestation
//! - a "number of weeks pregnant" observation carrying a value
//! - a pregnancy due date observation
//! - an enrollment in the PTV/ETV program at the report location
//!
//! The result is the latest qualifying date across all classes, or `null`.
//! Male patients, and patients without an index event, get `null`.

use crate::calculation::{FactKind, PatientCalculation};
use crate::common::{all_enrollments, all_obs, female, last_obs};
use crate::config::PregnancyDateConfig;
use crate::context::CalculationContext;
use crate::result::{FactResult, FactValue};
use crate::temporal::{add_months, within};
use chrono::NaiveDate;
use epts_diagnostics::Result;
use epts_model::{
    EnrollmentQuery, HivMetadata, ObsQuery, Observation, ObservationStore, ParameterValues, PatientSet,
};
use std::sync::Arc;

pub struct PregnantDateCalculation {
    store: Arc<dyn ObservationStore>,
    metadata: Arc<HivMetadata>,
    config: PregnancyDateConfig,
}

impl PregnantDateCalculation {
    pub const NAME: &'static str = "pregnantDate";

    pub fn new(store: Arc<dyn ObservationStore>, metadata: Arc<HivMetadata>, config: PregnancyDateConfig) -> Self {
        Self { store, metadata, config }
    }
}

/// Latest encounter date among `observations` that falls in `[start, end]`
fn latest_in(observations: &[Observation], start: NaiveDate, end: NaiveDate) -> Option<NaiveDate> {
    observations
        .iter()
        .map(Observation::encounter_date)
        .filter(|d| within(*d, start, end))
        .max()
}

impl PatientCalculation for PregnantDateCalculation {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> FactKind {
        FactKind::Date
    }

    fn evaluate(&self, cohort: &PatientSet, _params: &ParameterValues, ctx: &CalculationContext) -> Result<FactResult> {
        let location = ctx.location()?;
        let now = ctx.now();
        let md = &self.metadata;
        let store = self.store.as_ref();

        let mut result = FactResult::for_cohort(cohort, FactValue::Date(None));
        let women = female(store, cohort)?;
        if women.is_empty() {
            return Ok(result);
        }

        let last_vl = last_obs(
            store,
            &ObsQuery::new(md.hiv_viral_load)
                .encounter_types([md.laboratory, md.adult_followup, md.pediatric_followup])
                .location(location)
                .on_or_after(add_months(now, -self.config.index_lookback_months))
                .on_or_before(now),
            &women,
        )?;
        let pregnant = all_obs(
            store,
            &ObsQuery::new(md.pregnant).answer(md.gestation).location(location),
            &women,
        )?;
        let by_weeks = all_obs(
            store,
            &ObsQuery::new(md.number_of_weeks_pregnant).location(location),
            &women,
        )?;
        let due_date = all_obs(
            store,
            &ObsQuery::new(md.pregnancy_due_date).location(location),
            &women,
        )?;
        let in_program = all_enrollments(
            store,
            &EnrollmentQuery::new(md.ptv_etv_program).location(location),
            &women,
        )?;

        let empty = Vec::new();
        for patient in &women {
            let Some(index) = last_vl.get(patient).and_then(Option::as_ref).map(|o| o.obs_date) else {
                continue;
            };
            let start = add_months(index, -self.config.evidence_window_months);

            let weeks: Vec<Observation> = by_weeks
                .get(patient)
                .unwrap_or(&empty)
                .iter()
                .filter(|o| o.value_numeric().is_some())
                .cloned()
                .collect();
            let enrolled = in_program
                .get(patient)
                .into_iter()
                .flatten()
                .map(|e| e.date_enrolled)
                .filter(|d| within(*d, start, index))
                .max();

            let candidates = [
                latest_in(pregnant.get(patient).unwrap_or(&empty), start, index),
                latest_in(&weeks, start, index),
                latest_in(due_date.get(patient).unwrap_or(&empty), start, index),
                enrolled,
            ];
            let latest = candidates.into_iter().flatten().max();
            result.insert(*patient, FactValue::Date(latest));
        }

        log::debug!(
            "{}: {} of {} patients with pregnancy evidence",
            Self::NAME,
            result.patients_that_pass().len(),
            cohort.len()
        );
        Ok(result)
    }
}
