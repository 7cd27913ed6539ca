//! Completed isoniazid preventive therapy (IPT)
//!
//! A patient completed IPT when either
//! - a start date and a completion date were recorded and the completion is
//!   at least `minimum_duration_days` after the start, or
//! - no completion date was recorded but enough "yes" isoniazid usage answers
//!   were recorded in the months following the start date.
//!
//! The two branches are exclusive: a recorded completion date always decides.
//! A completion date without a start date, or before the start date, is
//! inconsistent evidence and yields `false`.

use crate::calculation::{FactKind, PatientCalculation};
use crate::common::{all_obs, first_obs, last_obs};
use crate::config::CompletedIptConfig;
use crate::context::CalculationContext;
use crate::result::{FactResult, FactValue};
use crate::temporal::{add_months, days_between};
use chrono::NaiveDate;
use epts_diagnostics::Result;
use epts_model::{HivMetadata, ObsQuery, Observation, ObservationStore, ParameterValues, PatientSet};
use std::sync::Arc;

pub const BEGIN_PERIOD_START_DATE: &str = "beginPeriodStartDate";
pub const BEGIN_PERIOD_END_DATE: &str = "beginPeriodEndDate";
pub const COMPLETION_PERIOD_START_DATE: &str = "completionPeriodStartDate";
pub const COMPLETION_PERIOD_END_DATE: &str = "completionPeriodEndDate";

pub struct CompletedIptCalculation {
    store: Arc<dyn ObservationStore>,
    metadata: Arc<HivMetadata>,
    config: CompletedIptConfig,
}

impl CompletedIptCalculation {
    pub const NAME: &'static str = "completedIsoniazidProphylaxis";

    pub fn new(store: Arc<dyn ObservationStore>, metadata: Arc<HivMetadata>, config: CompletedIptConfig) -> Self {
        Self { store, metadata, config }
    }

    fn usage_count(&self, start: NaiveDate, usage: &[Observation]) -> usize {
        let end = add_months(start, self.config.usage_window_months);
        usage
            .iter()
            .filter(|o| o.obs_date >= start && o.obs_date <= end)
            .count()
    }
}

impl PatientCalculation for CompletedIptCalculation {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> FactKind {
        FactKind::Boolean
    }

    fn evaluate(&self, cohort: &PatientSet, params: &ParameterValues, ctx: &CalculationContext) -> Result<FactResult> {
        let location = ctx.location()?;
        let begin = (
            ctx.optional_date_parameter(params, BEGIN_PERIOD_START_DATE)?,
            ctx.optional_date_parameter(params, BEGIN_PERIOD_END_DATE)?,
        );
        let completion = (
            ctx.optional_date_parameter(params, COMPLETION_PERIOD_START_DATE)?,
            ctx.optional_date_parameter(params, COMPLETION_PERIOD_END_DATE)?,
        );
        let md = &self.metadata;
        let store = self.store.as_ref();

        let starts = first_obs(
            store,
            &ObsQuery::new(md.ipt_start_date).location(location).window(begin.0, begin.1),
            cohort,
        )?;
        let ends = last_obs(
            store,
            &ObsQuery::new(md.ipt_end_date).location(location).window(completion.0, completion.1),
            cohort,
        )?;
        let usage = all_obs(
            store,
            &ObsQuery::new(md.isoniazid_usage)
                .answer(md.yes)
                .encounter_types(md.followup_encounter_types())
                .location(location),
            cohort,
        )?;

        let mut result = FactResult::for_cohort(cohort, FactValue::Boolean(false));
        for patient in cohort {
            let start = starts.get(patient).and_then(Option::as_ref).and_then(Observation::value_datetime);
            let end = ends.get(patient).and_then(Option::as_ref).and_then(Observation::value_datetime);

            let completed = match (start, end) {
                (Some(start), Some(end)) if end < start => {
                    log::warn!("patient {}: IPT completion {} precedes start {}", patient, end, start);
                    false
                }
                (None, Some(end)) => {
                    log::warn!("patient {}: IPT completion {} without a start date", patient, end);
                    false
                }
                (Some(start), Some(end)) => days_between(start, end) >= self.config.minimum_duration_days,
                (Some(start), None) => {
                    let usage = usage.get(patient).map(Vec::as_slice).unwrap_or_default();
                    self.usage_count(start, usage) >= self.config.minimum_usage_count
                }
                (None, None) => false,
            };
            result.insert(*patient, FactValue::Boolean(completed));
        }

        log::debug!(
            "{}: {} of {} patients completed",
            Self::NAME,
            result.patients_that_pass().len(),
            cohort.len()
        );
        Ok(result)
    }
}
