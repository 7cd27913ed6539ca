//! Pregnancy date tests

mod common;

use common::*;
use epts_calc::calculations::PregnantDateCalculation;
use epts_calc::{FactResult, FactValue, PatientCalculation, PregnancyDateConfig};
use epts_model::{InMemoryStore, ObsValue, ParameterValues, PatientId};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn evaluate(store: Arc<InMemoryStore>, ids: &[i64]) -> FactResult {
    let cohort = cohort(ids);
    PregnantDateCalculation::new(store, metadata(), PregnancyDateConfig::default())
        .evaluate(&cohort, &ParameterValues::new(), &context(date(2020, 12, 31), &cohort))
        .unwrap()
}

/// Female patient with a viral load on 2020-06-01
fn indexed(patient: i64) -> StoreFixture {
    StoreFixture::new()
        .female(patient)
        .viral_load(patient, date(2020, 6, 1), 400.0)
}

#[test]
fn test_latest_evidence_wins() {
    let store = indexed(1)
        .coded(1, PREGNANT, ADULT, date(2020, 2, 1), GESTATION)
        .datetime(1, DUE_DATE, ADULT, date(2020, 4, 1), date(2020, 11, 1))
        .build();

    let result = evaluate(store, &[1]);
    assert_eq!(result.date(PatientId(1)), Some(date(2020, 4, 1)));
}

#[test]
fn test_enrollment_counts_at_report_location_only() {
    let store = indexed(1)
        .coded(1, PREGNANT, ADULT, date(2020, 2, 1), GESTATION)
        .enrollment_at(1, PTV_ETV, date(2020, 5, 20), OTHER_LOCATION)
        .build();
    assert_eq!(evaluate(store, &[1]).date(PatientId(1)), Some(date(2020, 2, 1)));

    let store = indexed(1)
        .coded(1, PREGNANT, ADULT, date(2020, 2, 1), GESTATION)
        .enrollment(1, PTV_ETV, date(2020, 5, 20))
        .build();
    assert_eq!(evaluate(store, &[1]).date(PatientId(1)), Some(date(2020, 5, 20)));
}

#[test]
fn test_weeks_pregnant_needs_a_value() {
    let store = indexed(1)
        .obs(1, WEEKS_PREGNANT, ADULT, date(2020, 5, 1), None)
        .numeric(1, WEEKS_PREGNANT, ADULT, date(2020, 3, 1), 12.0)
        .build();

    assert_eq!(evaluate(store, &[1]).date(PatientId(1)), Some(date(2020, 3, 1)));
}

#[test]
fn test_window_is_inclusive_at_both_ends() {
    let store = indexed(1)
        .coded(1, PREGNANT, ADULT, date(2019, 9, 1), GESTATION)
        .build();
    assert_eq!(evaluate(store, &[1]).date(PatientId(1)), Some(date(2019, 9, 1)));

    let store = indexed(1)
        .datetime(1, DUE_DATE, ADULT, date(2020, 6, 1), date(2020, 12, 1))
        .build();
    assert_eq!(evaluate(store, &[1]).date(PatientId(1)), Some(date(2020, 6, 1)));
}

#[test]
fn test_evidence_outside_window_is_ignored() {
    let store = indexed(1)
        .coded(1, PREGNANT, ADULT, date(2019, 8, 31), GESTATION)
        .datetime(1, DUE_DATE, ADULT, date(2020, 6, 2), date(2020, 12, 1))
        .build();

    assert_eq!(evaluate(store, &[1]).get(PatientId(1)), Some(&FactValue::Date(None)));
}

#[test]
fn test_pregnant_answer_must_be_gestation() {
    let store = indexed(1)
        .coded(1, PREGNANT, ADULT, date(2020, 2, 1), YES)
        .build();

    assert_eq!(evaluate(store, &[1]).date(PatientId(1)), None);
}

#[test]
fn test_no_index_event_means_no_date() {
    let store = StoreFixture::new()
        .female(1)
        .viral_load(1, date(2019, 11, 1), 400.0)
        .coded(1, PREGNANT, ADULT, date(2019, 10, 1), GESTATION)
        .build();

    assert_eq!(evaluate(store, &[1]).date(PatientId(1)), None);
}

#[test]
fn test_viral_load_at_other_location_is_not_an_index_event() {
    let store = StoreFixture::new()
        .female(1)
        .obs_at(1, VIRAL_LOAD, LAB, date(2020, 6, 1), Some(ObsValue::Numeric(20.0)), OTHER_LOCATION)
        .coded(1, PREGNANT, ADULT, date(2020, 2, 1), GESTATION)
        .build();

    assert_eq!(evaluate(store, &[1]).date(PatientId(1)), None);
}

#[test]
fn test_male_patients_get_null() {
    let store = StoreFixture::new()
        .male(2)
        .viral_load(2, date(2020, 6, 1), 400.0)
        .coded(2, PREGNANT, ADULT, date(2020, 2, 1), GESTATION)
        .build();

    let result = evaluate(store, &[2, 3]);
    assert_eq!(result.len(), 2);
    assert_eq!(result.get(PatientId(2)), Some(&FactValue::Date(None)));
    assert_eq!(result.get(PatientId(3)), Some(&FactValue::Date(None)));
}
