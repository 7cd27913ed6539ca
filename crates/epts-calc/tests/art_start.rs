//! ART initiation and time on ART tests

mod common;

use common::*;
use epts_calc::calculations::{InitialArtStartDateCalculation, OnArtForMonthsCalculation, MONTHS};
use epts_calc::{CalculationRef, FactResult, OnArtForMonthsConfig, PatientCalculation};
use epts_diagnostics::{EptsError, EPTS0103};
use epts_model::{InMemoryStore, ObsValue, ParamValue, ParameterValues, PatientId};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;

fn art_start(store: Arc<InMemoryStore>) -> InitialArtStartDateCalculation {
    InitialArtStartDateCalculation::new(store, metadata())
}

fn start_dates(store: Arc<InMemoryStore>, ids: &[i64]) -> FactResult {
    let cohort = cohort(ids);
    art_start(store)
        .evaluate(&cohort, &ParameterValues::new(), &context(date(2019, 12, 31), &cohort))
        .unwrap()
}

fn try_on_art(store: Arc<InMemoryStore>, ids: &[i64], params: &ParameterValues) -> Result<FactResult, EptsError> {
    let delegate: CalculationRef = Arc::new(art_start(store.clone()));
    let cohort = cohort(ids);
    OnArtForMonthsCalculation::new(store, metadata(), delegate, OnArtForMonthsConfig::default())
        .evaluate(&cohort, params, &context(date(2019, 6, 30), &cohort))
}

fn on_art(store: Arc<InMemoryStore>, ids: &[i64], params: &ParameterValues) -> FactResult {
    try_on_art(store, ids, params).unwrap()
}

// ============================================================================
// Initial ART start date
// ============================================================================

#[test]
fn test_earliest_source_wins() {
    let store = StoreFixture::new()
        .enrollment(1, ART, date(2019, 5, 1))
        .encounter(1, PHARMACY, date(2019, 3, 1))
        .datetime(1, HISTORICAL_ART_START, ADULT, date(2019, 6, 1), date(2019, 1, 18))
        .coded(1, ARV_PLAN, ADULT, date(2019, 4, 1), START_DRUGS)
        .build();

    assert_eq!(start_dates(store, &[1]).date(PatientId(1)), Some(date(2019, 1, 18)));
}

#[test]
fn test_each_source_alone() {
    let store = StoreFixture::new()
        .enrollment(1, ART, date(2019, 5, 1))
        .encounter(2, PHARMACY, date(2019, 3, 1))
        .datetime(3, HISTORICAL_ART_START, ADULT, date(2019, 6, 1), date(2019, 1, 18))
        .coded(4, ARV_PLAN, PEDIATRIC, date(2019, 4, 1), START_DRUGS)
        .build();

    let result = start_dates(store, &[1, 2, 3, 4, 5]);
    assert_eq!(result.date(PatientId(1)), Some(date(2019, 5, 1)));
    assert_eq!(result.date(PatientId(2)), Some(date(2019, 3, 1)));
    assert_eq!(result.date(PatientId(3)), Some(date(2019, 1, 18)));
    assert_eq!(result.date(PatientId(4)), Some(date(2019, 4, 1)));
    assert_eq!(result.date(PatientId(5)), None);
    assert_eq!(result.len(), 5);
}

#[test]
fn test_arv_plan_must_start_drugs() {
    let store = StoreFixture::new()
        .coded(1, ARV_PLAN, ADULT, date(2019, 4, 1), YES)
        .coded(1, ARV_PLAN, LAB, date(2019, 2, 1), START_DRUGS)
        .build();

    assert_eq!(start_dates(store, &[1]).date(PatientId(1)), None);
}

#[test]
fn test_other_location_and_future_records_are_ignored() {
    let store = StoreFixture::new()
        .enrollment_at(1, ART, date(2019, 2, 1), OTHER_LOCATION)
        .obs_at(
            1,
            HISTORICAL_ART_START,
            ADULT,
            date(2019, 3, 1),
            Some(ObsValue::Datetime(date(2018, 1, 1))),
            OTHER_LOCATION,
        )
        .encounter(1, PHARMACY, date(2020, 3, 1))
        .enrollment(1, ART, date(2019, 8, 1))
        .build();

    assert_eq!(start_dates(store, &[1]).date(PatientId(1)), Some(date(2019, 8, 1)));
}

// ============================================================================
// On ART for more than X months
// ============================================================================

#[test]
fn test_on_art_for_three_months() {
    let store = StoreFixture::new()
        // started 2018-10-21, result 2019-02-02
        .coded(6, ARV_PLAN, ADULT, date(2018, 10, 21), START_DRUGS)
        .viral_load(6, date(2019, 2, 2), 40.0)
        // started 2019-01-20, last result before that
        .coded(999, ARV_PLAN, ADULT, date(2019, 1, 20), START_DRUGS)
        .viral_load(999, date(2018, 12, 12), 40.0)
        // started without any result
        .enrollment(8, ART, date(2019, 1, 21))
        // result without ART
        .viral_load(432, date(2018, 12, 12), 40.0)
        .build();

    let result = on_art(store, &[6, 999, 8, 432], &ParameterValues::new());
    assert_eq!(result.patients_that_pass(), cohort(&[6]));
    assert_eq!(result.len(), 4);
}

#[test]
fn test_last_result_is_used() {
    let store = StoreFixture::new()
        .coded(999, ARV_PLAN, ADULT, date(2019, 1, 20), START_DRUGS)
        .viral_load(999, date(2018, 12, 12), 40.0)
        .viral_load(999, date(2019, 5, 10), 140.0)
        .build();

    assert!(on_art(store, &[999], &ParameterValues::new()).is_true(PatientId(999)));
}

#[test]
fn test_months_parameter_overrides_configuration() {
    let store = StoreFixture::new()
        .coded(6, ARV_PLAN, ADULT, date(2018, 10, 21), START_DRUGS)
        .viral_load(6, date(2019, 2, 2), 40.0)
        .build();

    let mut params = ParameterValues::new();
    params.insert(MONTHS.into(), ParamValue::Integer(6));
    assert!(!on_art(store, &[6], &params).is_true(PatientId(6)));
}

#[rstest]
#[case::too_large(i64::MAX)]
#[case::too_small(i64::MIN)]
fn test_months_parameter_out_of_range(#[case] months: i64) {
    let store = StoreFixture::new()
        .coded(6, ARV_PLAN, ADULT, date(2018, 10, 21), START_DRUGS)
        .viral_load(6, date(2019, 2, 2), 40.0)
        .build();

    let mut params = ParameterValues::new();
    params.insert(MONTHS.into(), ParamValue::Integer(months));
    let err = try_on_art(store, &[6], &params).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.code(), EPTS0103);
}
