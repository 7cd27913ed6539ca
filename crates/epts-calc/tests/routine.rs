//! Routine viral load monitoring tests

mod common;

use common::*;
use epts_calc::calculations::{InitialArtStartDateCalculation, RoutineViralLoadCalculation};
use epts_calc::{CalculationRef, FactResult, PatientCalculation, RoutineViralLoadConfig};
use epts_model::{InMemoryStore, ParameterValues, PatientId};
use rstest::rstest;
use std::sync::Arc;

fn evaluate_at(store: Arc<InMemoryStore>, ids: &[i64], now: chrono::NaiveDate) -> FactResult {
    let metadata = metadata();
    let art_start: CalculationRef = Arc::new(InitialArtStartDateCalculation::new(store.clone(), metadata.clone()));
    let cohort = cohort(ids);
    RoutineViralLoadCalculation::new(store, metadata, art_start, RoutineViralLoadConfig::default())
        .evaluate(&cohort, &ParameterValues::new(), &context(now, &cohort))
        .unwrap()
}

fn on_art(patient: i64, since: chrono::NaiveDate) -> StoreFixture {
    StoreFixture::new().female(patient).enrollment(patient, ART, since)
}

// ============================================================================
// Single result after initiation
// ============================================================================

#[rstest]
#[case::seven_and_a_half_months(date(2020, 8, 15), true)]
#[case::nine_and_a_half_months(date(2020, 10, 15), false)]
#[case::exactly_nine_months(date(2020, 10, 1), true)]
#[case::exactly_six_months(date(2020, 7, 1), false)]
fn test_single_result_after_initiation(#[case] taken: chrono::NaiveDate, #[case] expected: bool) {
    let store = on_art(1, date(2020, 1, 1)).viral_load(1, taken, 150.0).build();

    let result = evaluate_at(store, &[1], date(2021, 1, 1));
    assert_eq!(result.is_true(PatientId(1)), expected);
}

#[test]
fn test_without_art_start_never_routine() {
    let store = StoreFixture::new()
        .female(1)
        .viral_load(1, date(2020, 8, 15), 150.0)
        .build();

    assert!(!evaluate_at(store, &[1], date(2021, 1, 1)).is_true(PatientId(1)));
}

#[test]
fn test_latest_result_outside_window_never_routine() {
    let store = on_art(1, date(2019, 1, 1))
        .viral_load(1, date(2019, 8, 15), 150.0)
        .build();

    assert!(!evaluate_at(store, &[1], date(2021, 1, 1)).is_true(PatientId(1)));
}

// ============================================================================
// Repeat after a suppressed result
//
// The pair comes from the whole history, so the suppressed result usually
// predates the 12-month window that holds the current one.
// ============================================================================

#[rstest]
#[case::suppressed(800.0, true)]
#[case::not_suppressed(1200.0, false)]
#[case::threshold_is_exclusive(1000.0, false)]
fn test_repeat_after_suppression(#[case] previous: f64, #[case] expected: bool) {
    let store = on_art(1, date(2019, 1, 1))
        .viral_load(1, date(2020, 1, 1), previous)
        .viral_load(1, date(2021, 2, 1), 50.0)
        .build();

    let result = evaluate_at(store, &[1], date(2021, 3, 1));
    assert_eq!(result.is_true(PatientId(1)), expected);
}

#[rstest]
#[case::ten_months(date(2020, 3, 2), false)]
#[case::fifteen_months(date(2019, 11, 1), true)]
#[case::sixteen_months(date(2019, 10, 1), false)]
fn test_repeat_gap_bounds(#[case] previous: chrono::NaiveDate, #[case] expected: bool) {
    let store = on_art(1, date(2019, 1, 1))
        .viral_load(1, previous, 40.0)
        .viral_load(1, date(2021, 2, 1), 50.0)
        .build();

    let result = evaluate_at(store, &[1], date(2021, 3, 1));
    assert_eq!(result.is_true(PatientId(1)), expected);
}

#[test]
fn test_previous_result_may_predate_window() {
    // 13 months apart; only the current result is inside [now-12m, now]
    let store = on_art(1, date(2019, 1, 1))
        .viral_load(1, date(2019, 12, 15), 400.0)
        .viral_load(1, date(2021, 1, 15), 50.0)
        .build();

    assert!(evaluate_at(store, &[1], date(2021, 2, 1)).is_true(PatientId(1)));
}

#[test]
fn test_repeat_pairs_follow_record_creation_order() {
    // The later result was recorded first, so by creation order the
    // "previous" result is dated after the "current" one
    let store = on_art(1, date(2019, 1, 1))
        .viral_load(1, date(2021, 2, 1), 50.0)
        .viral_load(1, date(2020, 1, 1), 800.0)
        .build();

    assert!(!evaluate_at(store, &[1], date(2021, 3, 1)).is_true(PatientId(1)));
}

// ============================================================================
// Regimen change
// ============================================================================

fn regimen_change(patient: i64) -> StoreFixture {
    on_art(patient, date(2019, 1, 1))
        .encounter(patient, ADULT, date(2020, 3, 1))
        .coded(patient, REGIMEN, ADULT, date(2020, 5, 1), 6100)
}

#[test]
fn test_regimen_change_before_latest_result() {
    let store = regimen_change(1).viral_load(1, date(2020, 9, 1), 2000.0).build();

    assert!(evaluate_at(store, &[1], date(2021, 1, 1)).is_true(PatientId(1)));
}

#[test]
fn test_result_between_followup_and_latest_disqualifies() {
    let store = regimen_change(1)
        .viral_load(1, date(2020, 6, 1), 5000.0)
        .viral_load(1, date(2020, 9, 1), 2000.0)
        .build();

    assert!(!evaluate_at(store, &[1], date(2021, 1, 1)).is_true(PatientId(1)));
}

#[test]
fn test_regimen_change_after_latest_result() {
    let store = on_art(1, date(2019, 1, 1))
        .encounter(1, ADULT, date(2020, 3, 1))
        .viral_load(1, date(2020, 9, 1), 2000.0)
        .coded(1, REGIMEN, ADULT, date(2020, 10, 1), 6100)
        .build();

    assert!(!evaluate_at(store, &[1], date(2021, 1, 1)).is_true(PatientId(1)));
}

#[test]
fn test_pediatric_followup_is_the_fallback() {
    let store = on_art(1, date(2019, 1, 1))
        .encounter(1, PEDIATRIC, date(2020, 3, 1))
        .coded(1, REGIMEN, PEDIATRIC, date(2020, 5, 1), 6100)
        .viral_load(1, date(2020, 9, 1), 2000.0)
        .build();

    assert!(evaluate_at(store, &[1], date(2021, 1, 1)).is_true(PatientId(1)));
}

#[test]
fn test_without_followup_regimen_change_is_not_enough() {
    let store = on_art(1, date(2019, 1, 1))
        .coded(1, REGIMEN, PHARMACY, date(2020, 5, 1), 6100)
        .viral_load(1, date(2020, 9, 1), 2000.0)
        .build();

    assert!(!evaluate_at(store, &[1], date(2021, 1, 1)).is_true(PatientId(1)));
}

#[test]
fn test_every_patient_has_an_entry() {
    let store = on_art(1, date(2020, 1, 1)).viral_load(1, date(2020, 8, 15), 150.0).build();

    let result = evaluate_at(store, &[1, 2, 3], date(2021, 1, 1));
    assert_eq!(result.len(), 3);
    assert_eq!(result.patients_that_pass(), cohort(&[1]));
}
