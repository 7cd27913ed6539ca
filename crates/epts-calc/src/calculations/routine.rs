//! Routine viral load monitoring for adults and children
//!
//! A patient with a viral load result in the last twelve months is on
//! routine monitoring when one of the following holds, checked in order:
//!
//! 1. that is the only result in the window and it was taken more than six
//!    and at most nine months after ART initiation;
//! 2. the result before the latest one (by record creation order) was
//!    suppressed and was taken twelve to fifteen months before the latest;
//! 3. the regimen changed before the latest result and no other result was
//!    recorded between the first follow-up visit and the latest result.

use crate::calculation::{CalculationRef, FactKind, PatientCalculation};
use crate::common::{all_obs, first_encounter, last_obs};
use crate::config::RoutineViralLoadConfig;
use crate::context::CalculationContext;
use crate::result::{FactResult, FactValue};
use crate::temporal::{add_months, months_between};
use chrono::NaiveDate;
use epts_diagnostics::Result;
use epts_model::{
    Encounter, EncounterQuery, HivMetadata, ObsQuery, Observation, ObservationStore, ParameterValues,
    PatientSet,
};
use std::sync::Arc;

pub struct RoutineViralLoadCalculation {
    store: Arc<dyn ObservationStore>,
    metadata: Arc<HivMetadata>,
    art_start: CalculationRef,
    config: RoutineViralLoadConfig,
}

/// Everything known about one patient that the criteria look at
struct Evidence<'a> {
    art_start: NaiveDate,
    /// Results strictly inside the monitoring window
    in_window: Vec<&'a Observation>,
    /// Every result on or before "now"
    history: &'a [Observation],
    latest: NaiveDate,
    regimen: Option<&'a Observation>,
    first_followup: Option<NaiveDate>,
}

impl RoutineViralLoadCalculation {
    pub const NAME: &'static str = "routineViralLoad";

    pub fn new(
        store: Arc<dyn ObservationStore>,
        metadata: Arc<HivMetadata>,
        art_start: CalculationRef,
        config: RoutineViralLoadConfig,
    ) -> Self {
        Self {
            store,
            metadata,
            art_start,
            config,
        }
    }

    fn single_result_after_initiation(&self, ev: &Evidence<'_>) -> bool {
        let [only] = ev.in_window.as_slice() else {
            return false;
        };
        let after = add_months(ev.art_start, self.config.first_result_after_months);
        let until = add_months(ev.art_start, self.config.first_result_until_months);
        only.obs_date > after && only.obs_date <= until
    }

    fn repeat_after_suppression(&self, ev: &Evidence<'_>) -> bool {
        if ev.in_window.is_empty() {
            return false;
        }
        // the window only gates the criterion; the pair is taken from the full history
        let mut by_creation: Vec<&Observation> = ev.history.iter().collect();
        by_creation.sort_by_key(|o| o.id);
        let [.., previous, current] = by_creation.as_slice() else {
            return false;
        };
        let Some(value) = previous.value_numeric() else {
            log::debug!("patient {}: viral load {} has no numeric value", previous.patient, previous.id);
            return false;
        };
        if value >= self.config.suppressed_below || previous.obs_date >= current.obs_date {
            return false;
        }
        let months = months_between(previous.obs_date, current.obs_date);
        months >= self.config.repeat_min_months && months <= self.config.repeat_max_months
    }

    fn regimen_change_without_spoiler(&self, ev: &Evidence<'_>) -> bool {
        if ev.in_window.is_empty() {
            return false;
        }
        let (Some(regimen), Some(followup)) = (ev.regimen, ev.first_followup) else {
            return false;
        };
        if followup > ev.latest || regimen.obs_date >= ev.latest {
            return false;
        }
        !ev.history
            .iter()
            .any(|o| o.obs_date > followup && o.obs_date < ev.latest)
    }
}

fn encounter_date(encounter: Option<&Option<Encounter>>) -> Option<NaiveDate> {
    encounter.and_then(Option::as_ref).map(|e| e.encounter_date)
}

impl PatientCalculation for RoutineViralLoadCalculation {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> FactKind {
        FactKind::Boolean
    }

    fn evaluate(&self, cohort: &PatientSet, params: &ParameterValues, ctx: &CalculationContext) -> Result<FactResult> {
        let now = ctx.now();
        let md = &self.metadata;
        let store = self.store.as_ref();

        let art_starts = self.art_start.evaluate(cohort, params, ctx)?;
        let results = all_obs(store, &ObsQuery::new(md.hiv_viral_load).on_or_before(now), cohort)?;
        let regimens = last_obs(store, &ObsQuery::new(md.regimen).on_or_before(now), cohort)?;
        let adult = first_encounter(store, &EncounterQuery::of_type(md.adult_followup).on_or_before(now), cohort)?;
        let pediatric = first_encounter(
            store,
            &EncounterQuery::of_type(md.pediatric_followup).on_or_before(now),
            cohort,
        )?;

        let lower = add_months(now, -self.config.window_months);
        let mut result = FactResult::for_cohort(cohort, FactValue::Boolean(false));
        for patient in cohort {
            let Some(art_start) = art_starts.date(*patient) else {
                continue;
            };
            let history = results.get(patient).map(Vec::as_slice).unwrap_or_default();
            let Some(latest) = history.last().map(|o| o.obs_date) else {
                continue;
            };

            let in_window: Vec<&Observation> = if latest > lower && latest < now {
                history
                    .iter()
                    .filter(|o| o.obs_date > lower && o.obs_date < now)
                    .collect()
            } else {
                Vec::new()
            };
            let evidence = Evidence {
                art_start,
                in_window,
                history,
                latest,
                regimen: regimens.get(patient).and_then(Option::as_ref),
                first_followup: encounter_date(adult.get(patient)).or_else(|| encounter_date(pediatric.get(patient))),
            };

            let on_routine = self.single_result_after_initiation(&evidence)
                || self.repeat_after_suppression(&evidence)
                || self.regimen_change_without_spoiler(&evidence);
            result.insert(*patient, FactValue::Boolean(on_routine));
        }

        log::debug!(
            "{}: {} of {} patients on routine monitoring",
            Self::NAME,
            result.patients_that_pass().len(),
            cohort.len()
        );
        Ok(result)
    }
}
