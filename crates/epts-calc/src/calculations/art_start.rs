//! Initial ART start date
//!
//! The earliest of four independent records, each restricted to the report
//! location and to dates on or before "now":
//!
//! - an ARV plan observation answered "start drugs" in a follow-up or
//!   pharmacy encounter (dated by the observation)
//! - the value of a historical ART start date observation
//! - the first pharmacy encounter
//! - the enrollment date in the ART program

use crate::calculation::{FactKind, PatientCalculation};
use crate::common::{first_encounter, first_enrollment, first_obs};
use crate::context::CalculationContext;
use crate::result::{FactResult, FactValue};
use epts_diagnostics::Result;
use epts_model::{
    EncounterQuery, EnrollmentQuery, HivMetadata, ObsQuery, Observation, ObservationStore, ParameterValues,
    PatientSet,
};
use std::sync::Arc;

pub struct InitialArtStartDateCalculation {
    store: Arc<dyn ObservationStore>,
    metadata: Arc<HivMetadata>,
}

impl InitialArtStartDateCalculation {
    pub const NAME: &'static str = "initialArtStartDate";

    pub fn new(store: Arc<dyn ObservationStore>, metadata: Arc<HivMetadata>) -> Self {
        Self { store, metadata }
    }
}

impl PatientCalculation for InitialArtStartDateCalculation {
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

        let plan_started = first_obs(
            store,
            &ObsQuery::new(md.arv_plan)
                .answer(md.start_drugs)
                .encounter_types([md.adult_followup, md.pediatric_followup, md.pharmacy])
                .location(location)
                .on_or_before(now),
            cohort,
        )?;
        // Historical dates are recorded at any time, so every one is checked
        let historical = store.observations(
            &ObsQuery::new(md.historical_art_start_date)
                .location(location)
                .on_or_before(now),
            cohort,
        )?;
        let pharmacy = first_encounter(
            store,
            &EncounterQuery::of_type(md.pharmacy).location(location).on_or_before(now),
            cohort,
        )?;
        let enrolled = first_enrollment(
            store,
            &EnrollmentQuery::new(md.art_program)
                .location(location)
                .enrolled_on_or_before(now),
            cohort,
        )?;

        let mut result = FactResult::for_cohort(cohort, FactValue::Date(None));
        for patient in cohort {
            let historical_date = historical
                .get(patient)
                .into_iter()
                .flatten()
                .filter_map(Observation::value_datetime)
                .filter(|d| *d <= now)
                .min();
            let candidates = [
                plan_started.get(patient).and_then(Option::as_ref).map(|o| o.obs_date),
                historical_date,
                pharmacy.get(patient).and_then(Option::as_ref).map(|e| e.encounter_date),
                enrolled.get(patient).and_then(Option::as_ref).map(|e| e.date_enrolled),
            ];
            result.insert(*patient, FactValue::Date(candidates.into_iter().flatten().min()));
        }

        log::debug!(
            "{}: {} of {} patients started ART",
            Self::NAME,
            result.patients_that_pass().len(),
            cohort.len()
        );
        Ok(result)
    }
}
