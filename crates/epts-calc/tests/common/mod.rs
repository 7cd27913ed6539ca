//! Shared fixtures for calculation tests
#![allow(dead_code)]

use chrono::NaiveDate;
use epts_calc::CalculationContext;
use epts_diagnostics::{EptsError, Result, EPTS0200};
use epts_model::{
    patient_set, ConceptId, Encounter, EncounterId, EncounterQuery, EncounterRef, EncounterTypeId, Enrollment,
    EnrollmentQuery, Gender, HivMetadata, InMemoryStore, LocationId, MetadataDictionary, ObsQuery, ObsValue,
    Observation, ObservationStore, PatientId, PatientRecords, PatientSet, Person, ProgramId, names,
};
use std::collections::BTreeMap;
use std::sync::Arc;

// ============================================================================
// Identifiers
// ============================================================================

pub const LOCATION: LocationId = LocationId(1);
pub const OTHER_LOCATION: LocationId = LocationId(2);

pub const VIRAL_LOAD: i64 = 856;
pub const REGIMEN: i64 = 1088;
pub const PREGNANT: i64 = 1982;
pub const GESTATION: i64 = 44;
pub const WEEKS_PREGNANT: i64 = 1279;
pub const DUE_DATE: i64 = 1600;
pub const YES: i64 = 1065;
pub const NO: i64 = 1066;
pub const IPT_START: i64 = 6128;
pub const IPT_END: i64 = 6129;
pub const ISONIAZID_USAGE: i64 = 6122;
pub const ARV_PLAN: i64 = 1255;
pub const START_DRUGS: i64 = 1256;
pub const HISTORICAL_ART_START: i64 = 1190;

pub const ADULT: i64 = 6;
pub const PEDIATRIC: i64 = 9;
pub const LAB: i64 = 13;
pub const PHARMACY: i64 = 18;

pub const PTV_ETV: i64 = 8;
pub const ART: i64 = 2;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn dictionary() -> MetadataDictionary {
    MetadataDictionary::new()
        .with_concept(names::HIV_VIRAL_LOAD, VIRAL_LOAD)
        .with_concept(names::REGIMEN, REGIMEN)
        .with_concept(names::PREGNANT, PREGNANT)
        .with_concept(names::GESTATION, GESTATION)
        .with_concept(names::NUMBER_OF_WEEKS_PREGNANT, WEEKS_PREGNANT)
        .with_concept(names::PREGNANCY_DUE_DATE, DUE_DATE)
        .with_concept(names::YES, YES)
        .with_concept(names::IPT_START_DATE, IPT_START)
        .with_concept(names::IPT_END_DATE, IPT_END)
        .with_concept(names::ISONIAZID_USAGE, ISONIAZID_USAGE)
        .with_concept(names::ARV_PLAN, ARV_PLAN)
        .with_concept(names::START_DRUGS, START_DRUGS)
        .with_concept(names::HISTORICAL_ART_START_DATE, HISTORICAL_ART_START)
        .with_encounter_type(names::ADULT_FOLLOWUP, ADULT)
        .with_encounter_type(names::PEDIATRIC_FOLLOWUP, PEDIATRIC)
        .with_encounter_type(names::LABORATORY, LAB)
        .with_encounter_type(names::PHARMACY, PHARMACY)
        .with_program(names::PTV_ETV, PTV_ETV)
        .with_program(names::ART, ART)
}

pub fn metadata() -> Arc<HivMetadata> {
    Arc::new(HivMetadata::from_dictionary(&dictionary()).unwrap())
}

/// Context at the fixture location with `cohort` as universe
pub fn context(now: NaiveDate, cohort: &PatientSet) -> CalculationContext {
    CalculationContext::builder(now)
        .universe(cohort.clone())
        .location(LOCATION)
        .build()
}

pub fn cohort(ids: &[i64]) -> PatientSet {
    patient_set(ids.iter().copied())
}

// ============================================================================
// Store fixture
// ============================================================================

/// Builder for small datasets. Observations get increasing ids in the order
/// they are added and each sits in its own encounter at [`LOCATION`] unless
/// stated otherwise.
pub struct StoreFixture {
    store: InMemoryStore,
    next_obs: i64,
    next_encounter: i64,
}

impl Default for StoreFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreFixture {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new(),
            next_obs: 1,
            next_encounter: 1000,
        }
    }

    pub fn female(mut self, patient: i64) -> Self {
        self.store.add_person(Person::new(PatientId(patient), Gender::Female));
        self
    }

    pub fn male(mut self, patient: i64) -> Self {
        self.store.add_person(Person::new(PatientId(patient), Gender::Male));
        self
    }

    pub fn died(mut self, patient: i64, on: NaiveDate) -> Self {
        let mut person = Person::new(PatientId(patient), Gender::Unknown);
        person.dead = true;
        person.death_date = Some(on);
        self.store.add_person(person);
        self
    }

    fn encounter_ref(&mut self, encounter_type: i64, on: NaiveDate) -> EncounterRef {
        self.next_encounter += 1;
        EncounterRef {
            id: EncounterId(self.next_encounter),
            encounter_type: EncounterTypeId(encounter_type),
            encounter_date: on,
        }
    }

    /// Observation at an explicit location
    pub fn obs_at(
        mut self,
        patient: i64,
        concept: i64,
        encounter_type: i64,
        on: NaiveDate,
        value: Option<ObsValue>,
        location: LocationId,
    ) -> Self {
        let encounter = self.encounter_ref(encounter_type, on);
        let mut obs = Observation::new(self.next_obs, PatientId(patient), ConceptId(concept), on)
            .with_location(location)
            .with_encounter(encounter);
        obs.value = value;
        self.next_obs += 1;
        self.store.add_observation(obs);
        self
    }

    pub fn obs(self, patient: i64, concept: i64, encounter_type: i64, on: NaiveDate, value: Option<ObsValue>) -> Self {
        self.obs_at(patient, concept, encounter_type, on, value, LOCATION)
    }

    pub fn numeric(self, patient: i64, concept: i64, encounter_type: i64, on: NaiveDate, value: f64) -> Self {
        self.obs(patient, concept, encounter_type, on, Some(ObsValue::Numeric(value)))
    }

    pub fn coded(self, patient: i64, concept: i64, encounter_type: i64, on: NaiveDate, answer: i64) -> Self {
        self.obs(patient, concept, encounter_type, on, Some(ObsValue::Coded(ConceptId(answer))))
    }

    pub fn datetime(self, patient: i64, concept: i64, encounter_type: i64, on: NaiveDate, value: NaiveDate) -> Self {
        self.obs(patient, concept, encounter_type, on, Some(ObsValue::Datetime(value)))
    }

    /// Viral load result recorded in a laboratory encounter
    pub fn viral_load(self, patient: i64, on: NaiveDate, copies: f64) -> Self {
        self.numeric(patient, VIRAL_LOAD, LAB, on, copies)
    }

    pub fn encounter(mut self, patient: i64, encounter_type: i64, on: NaiveDate) -> Self {
        let reference = self.encounter_ref(encounter_type, on);
        self.store.add_encounter(Encounter {
            id: reference.id,
            patient: PatientId(patient),
            encounter_type: reference.encounter_type,
            encounter_date: on,
            location: Some(LOCATION),
        });
        self
    }

    pub fn enrollment_at(mut self, patient: i64, program: i64, on: NaiveDate, location: LocationId) -> Self {
        self.store.add_enrollment(Enrollment {
            patient: PatientId(patient),
            program: ProgramId(program),
            location: Some(location),
            date_enrolled: on,
            date_completed: None,
        });
        self
    }

    pub fn enrollment(self, patient: i64, program: i64, on: NaiveDate) -> Self {
        self.enrollment_at(patient, program, on, LOCATION)
    }

    pub fn build(self) -> Arc<InMemoryStore> {
        Arc::new(self.store)
    }
}

// ============================================================================
// Failing store
// ============================================================================

/// Store whose every query fails
pub struct FailingStore;

fn unavailable<T>() -> Result<T> {
    Err(EptsError::data_access(EPTS0200, "connection refused"))
}

impl ObservationStore for FailingStore {
    fn observations(&self, _: &ObsQuery, _: &PatientSet) -> Result<PatientRecords<Observation>> {
        unavailable()
    }

    fn encounters(&self, _: &EncounterQuery, _: &PatientSet) -> Result<PatientRecords<Encounter>> {
        unavailable()
    }

    fn enrollments(&self, _: &EnrollmentQuery, _: &PatientSet) -> Result<PatientRecords<Enrollment>> {
        unavailable()
    }

    fn people(&self, _: &PatientSet) -> Result<BTreeMap<PatientId, Person>> {
        unavailable()
    }

    fn all_patients(&self) -> Result<PatientSet> {
        unavailable()
    }
}
