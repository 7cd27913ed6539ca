//! Completed isoniazid prophylaxis tests

mod common;

use common::*;
use epts_calc::calculations::{CompletedIptCalculation, BEGIN_PERIOD_START_DATE};
use epts_calc::{CalculationContext, CompletedIptConfig, FactValue, PatientCalculation};
use epts_diagnostics::EPTS0100;
use epts_model::{InMemoryStore, ParamValue, ParameterValues, PatientId};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;

fn calculation(store: Arc<InMemoryStore>) -> CompletedIptCalculation {
    CompletedIptCalculation::new(store, metadata(), CompletedIptConfig::default())
}

fn evaluate(store: Arc<InMemoryStore>, ids: &[i64]) -> epts_calc::FactResult {
    let cohort = cohort(ids);
    calculation(store)
        .evaluate(&cohort, &ParameterValues::new(), &context(date(2021, 1, 1), &cohort))
        .unwrap()
}

fn with_start(fixture: StoreFixture, patient: i64, start: chrono::NaiveDate) -> StoreFixture {
    fixture.datetime(patient, IPT_START, ADULT, start, start)
}

fn with_end(fixture: StoreFixture, patient: i64, end: chrono::NaiveDate) -> StoreFixture {
    fixture.datetime(patient, IPT_END, ADULT, end, end)
}

fn with_usage(mut fixture: StoreFixture, patient: i64, months: &[u32]) -> StoreFixture {
    for month in months {
        fixture = fixture.coded(patient, ISONIAZID_USAGE, ADULT, date(2020, *month, 15), YES);
    }
    fixture
}

// ============================================================================
// Explicit completion date
// ============================================================================

#[rstest]
#[case(date(2020, 7, 1), true)]
#[case(date(2020, 6, 29), true)]
#[case(date(2020, 6, 28), false)]
fn test_duration_threshold(#[case] end: chrono::NaiveDate, #[case] expected: bool) {
    let fixture = with_start(StoreFixture::new(), 1, date(2020, 1, 1));
    let store = with_end(fixture, 1, end).build();

    let result = evaluate(store, &[1]);
    assert_eq!(result.get(PatientId(1)), Some(&FactValue::Boolean(expected)));
}

#[test]
fn test_completion_before_start_is_not_completed() {
    let fixture = with_start(StoreFixture::new(), 1, date(2020, 7, 1));
    let store = with_end(fixture, 1, date(2020, 1, 1)).build();

    let result = evaluate(store, &[1]);
    assert_eq!(result.get(PatientId(1)), Some(&FactValue::Boolean(false)));
}

#[test]
fn test_completion_without_start_is_not_completed() {
    let fixture = with_end(StoreFixture::new(), 1, date(2020, 7, 1));
    let store = with_usage(fixture, 1, &[1, 2, 3, 4, 5, 6, 7]).build();

    let result = evaluate(store, &[1]);
    assert!(!result.is_true(PatientId(1)));
}

#[test]
fn test_short_completion_ignores_usage_count() {
    let fixture = with_start(StoreFixture::new(), 1, date(2020, 1, 1));
    let fixture = with_end(fixture, 1, date(2020, 3, 1));
    let store = with_usage(fixture, 1, &[1, 2, 3, 4, 5, 6, 7]).build();

    assert!(!evaluate(store, &[1]).is_true(PatientId(1)));
}

// ============================================================================
// Usage count substitute
// ============================================================================

#[test]
fn test_six_usage_answers_within_seven_months() {
    let fixture = with_start(StoreFixture::new(), 1, date(2020, 1, 1));
    let store = with_usage(fixture, 1, &[1, 2, 3, 4, 5, 6]).build();

    assert!(evaluate(store, &[1]).is_true(PatientId(1)));
}

#[test]
fn test_five_usage_answers_are_not_enough() {
    let fixture = with_start(StoreFixture::new(), 1, date(2020, 1, 1));
    // September falls outside the seven month window
    let store = with_usage(fixture, 1, &[1, 2, 3, 4, 5, 9]).build();

    assert!(!evaluate(store, &[1]).is_true(PatientId(1)));
}

#[test]
fn test_usage_answered_no_is_not_counted() {
    let fixture = with_start(StoreFixture::new(), 1, date(2020, 1, 1));
    let store = with_usage(fixture, 1, &[1, 2, 3, 4, 5])
        .coded(1, ISONIAZID_USAGE, ADULT, date(2020, 6, 15), NO)
        .build();

    assert!(!evaluate(store, &[1]).is_true(PatientId(1)));
}

#[test]
fn test_usage_in_pharmacy_encounter_is_not_counted() {
    let fixture = with_start(StoreFixture::new(), 1, date(2020, 1, 1));
    let store = with_usage(fixture, 1, &[1, 2, 3, 4, 5])
        .coded(1, ISONIAZID_USAGE, PHARMACY, date(2020, 6, 15), YES)
        .build();

    assert!(!evaluate(store, &[1]).is_true(PatientId(1)));
}

// ============================================================================
// Parameters and context
// ============================================================================

#[test]
fn test_start_outside_begin_period_is_ignored() {
    let fixture = with_start(StoreFixture::new(), 1, date(2020, 1, 1));
    let store = with_end(fixture, 1, date(2020, 7, 1)).build();
    let cohort = cohort(&[1]);

    let mut params = ParameterValues::new();
    params.insert(BEGIN_PERIOD_START_DATE.into(), ParamValue::Date(date(2020, 2, 1)));
    let result = calculation(store)
        .evaluate(&cohort, &params, &context(date(2021, 1, 1), &cohort))
        .unwrap();
    assert!(!result.is_true(PatientId(1)));
}

#[test]
fn test_every_patient_has_an_entry() {
    let fixture = with_start(StoreFixture::new(), 1, date(2020, 1, 1));
    let store = with_end(fixture, 1, date(2020, 7, 1)).build();

    let result = evaluate(store, &[1, 2, 3]);
    assert_eq!(result.len(), 3);
    assert_eq!(result.patients_that_pass(), cohort(&[1]));
}

#[test]
fn test_missing_location_is_configuration_error() {
    let cohort = cohort(&[1]);
    let ctx = CalculationContext::builder(date(2021, 1, 1)).build();
    let err = calculation(StoreFixture::new().build())
        .evaluate(&cohort, &ParameterValues::new(), &ctx)
        .unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.code(), EPTS0100);
}
