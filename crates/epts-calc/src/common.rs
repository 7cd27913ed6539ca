//! Shared store utilities
//!
//! Thin wrappers over the [`ObservationStore`] batch queries that turn the
//! store's sparse per-patient maps into maps with one entry for every cohort
//! patient, so calculators can index them without checking for absence.

use crate::result::{FactResult, FactValue};
use chrono::NaiveDate;
use epts_diagnostics::Result;
use epts_model::{
    Encounter, EncounterQuery, Enrollment, EnrollmentQuery, Gender, LocationId, ObsQuery, Observation,
    ObservationStore, PatientId, PatientSet, ProgramId,
};
use std::collections::BTreeMap;

/// One value per cohort patient
pub type PerPatient<T> = BTreeMap<PatientId, T>;

fn densify<T, U>(
    cohort: &PatientSet,
    mut sparse: BTreeMap<PatientId, Vec<T>>,
    pick: impl Fn(Vec<T>) -> U,
) -> PerPatient<U> {
    cohort
        .iter()
        .map(|p| (*p, pick(sparse.remove(p).unwrap_or_default())))
        .collect()
}

/// Earliest matching observation per patient
pub fn first_obs(
    store: &dyn ObservationStore,
    query: &ObsQuery,
    cohort: &PatientSet,
) -> Result<PerPatient<Option<Observation>>> {
    let found = store.observations(query, cohort)?;
    Ok(densify(cohort, found, |list| list.into_iter().next()))
}

/// Latest matching observation per patient
pub fn last_obs(
    store: &dyn ObservationStore,
    query: &ObsQuery,
    cohort: &PatientSet,
) -> Result<PerPatient<Option<Observation>>> {
    let found = store.observations(query, cohort)?;
    Ok(densify(cohort, found, |list| list.into_iter().last()))
}

/// Every matching observation per patient, chronological; empty when none
pub fn all_obs(
    store: &dyn ObservationStore,
    query: &ObsQuery,
    cohort: &PatientSet,
) -> Result<PerPatient<Vec<Observation>>> {
    let found = store.observations(query, cohort)?;
    Ok(densify(cohort, found, |list| list))
}

pub fn first_encounter(
    store: &dyn ObservationStore,
    query: &EncounterQuery,
    cohort: &PatientSet,
) -> Result<PerPatient<Option<Encounter>>> {
    let found = store.encounters(query, cohort)?;
    Ok(densify(cohort, found, |list| list.into_iter().next()))
}

pub fn first_enrollment(
    store: &dyn ObservationStore,
    query: &EnrollmentQuery,
    cohort: &PatientSet,
) -> Result<PerPatient<Option<Enrollment>>> {
    let found = store.enrollments(query, cohort)?;
    Ok(densify(cohort, found, |list| list.into_iter().next()))
}

/// Most recent enrollment in `program` still active on `on_date`
pub fn last_active_enrollment(
    store: &dyn ObservationStore,
    program: ProgramId,
    location: Option<LocationId>,
    on_date: NaiveDate,
    cohort: &PatientSet,
) -> Result<PerPatient<Option<Enrollment>>> {
    let mut query = EnrollmentQuery::new(program).active_on(on_date);
    if let Some(location) = location {
        query = query.location(location);
    }
    let found = store.enrollments(&query, cohort)?;
    Ok(densify(cohort, found, |list| list.into_iter().last()))
}

pub fn all_enrollments(
    store: &dyn ObservationStore,
    query: &EnrollmentQuery,
    cohort: &PatientSet,
) -> Result<PerPatient<Vec<Enrollment>>> {
    let found = store.enrollments(query, cohort)?;
    Ok(densify(cohort, found, |list| list))
}

/// Vital status on `now`; patients without a demographic record are not alive
pub fn alive(store: &dyn ObservationStore, cohort: &PatientSet, now: NaiveDate) -> Result<FactResult> {
    let people = store.people(cohort)?;
    let mut result = FactResult::for_cohort(cohort, FactValue::Boolean(false));
    for (id, person) in &people {
        result.insert(*id, FactValue::Boolean(person.is_alive_on(now)));
    }
    Ok(result)
}

/// Cohort patients alive on `now`
pub fn living(store: &dyn ObservationStore, cohort: &PatientSet, now: NaiveDate) -> Result<PatientSet> {
    Ok(alive(store, cohort, now)?.patients_that_pass())
}

/// Cohort patients recorded as female
pub fn female(store: &dyn ObservationStore, cohort: &PatientSet) -> Result<PatientSet> {
    of_gender(store, cohort, Gender::Female)
}

pub fn of_gender(store: &dyn ObservationStore, cohort: &PatientSet, gender: Gender) -> Result<PatientSet> {
    Ok(store
        .people(cohort)?
        .into_values()
        .filter(|p| p.gender == gender)
        .map(|p| p.id)
        .collect())
}

/// Patients whose fact passes
pub fn patients_that_pass(result: &FactResult) -> PatientSet {
    result.patients_that_pass()
}
