//! Observation store gateway
//!
//! The store is an external collaborator: it owns the clinical records and
//! answers batch queries for a whole cohort at once. Queries never fail for
//! "no data"; a patient without matching records is simply absent from the
//! returned map. Store-level failures surface as data access errors and are
//! propagated unchanged.

use crate::records::{Encounter, Enrollment, Observation, Person};
use crate::types::{ConceptId, EncounterTypeId, LocationId, PatientId, PatientSet, ProgramId};
use chrono::NaiveDate;
use epts_diagnostics::Result;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Per-patient records returned by a batch query
pub type PatientRecords<T> = BTreeMap<PatientId, Vec<T>>;

/// Read-only access to observations, encounters, enrollments and demographics
pub trait ObservationStore: Send + Sync {
    /// Observations matching `query`, chronological by (date, id) per patient
    fn observations(&self, query: &ObsQuery, cohort: &PatientSet) -> Result<PatientRecords<Observation>>;

    /// Encounters matching `query`, chronological per patient
    fn encounters(&self, query: &EncounterQuery, cohort: &PatientSet) -> Result<PatientRecords<Encounter>>;

    /// Enrollments matching `query`, ordered by enrollment date per patient
    fn enrollments(&self, query: &EnrollmentQuery, cohort: &PatientSet) -> Result<PatientRecords<Enrollment>>;

    /// Demographic records for the cohort
    fn people(&self, cohort: &PatientSet) -> Result<BTreeMap<PatientId, Person>>;

    /// Every patient known to the store
    fn all_patients(&self) -> Result<PatientSet>;
}

/// Filter for an observation query
#[derive(Debug, Clone, PartialEq)]
pub struct ObsQuery {
    pub concept: ConceptId,
    /// Coded answers to accept; `None` accepts any value
    pub answers: Option<SmallVec<[ConceptId; 2]>>,
    /// Encounter types to accept; empty accepts any encounter
    pub encounter_types: SmallVec<[EncounterTypeId; 4]>,
    /// Locations to accept; empty accepts any location
    pub locations: SmallVec<[LocationId; 2]>,
    pub on_or_after: Option<NaiveDate>,
    pub on_or_before: Option<NaiveDate>,
}

impl ObsQuery {
    pub fn new(concept: ConceptId) -> Self {
        Self {
            concept,
            answers: None,
            encounter_types: SmallVec::new(),
            locations: SmallVec::new(),
            on_or_after: None,
            on_or_before: None,
        }
    }

    pub fn answer(mut self, answer: ConceptId) -> Self {
        self.answers.get_or_insert_with(SmallVec::new).push(answer);
        self
    }

    pub fn encounter_types(mut self, types: impl IntoIterator<Item = EncounterTypeId>) -> Self {
        self.encounter_types.extend(types);
        self
    }

    pub fn location(mut self, location: LocationId) -> Self {
        self.locations.push(location);
        self
    }

    pub fn on_or_after(mut self, date: NaiveDate) -> Self {
        self.on_or_after = Some(date);
        self
    }

    pub fn on_or_before(mut self, date: NaiveDate) -> Self {
        self.on_or_before = Some(date);
        self
    }

    /// Apply optional window bounds in one call
    pub fn window(mut self, on_or_after: Option<NaiveDate>, on_or_before: Option<NaiveDate>) -> Self {
        self.on_or_after = on_or_after;
        self.on_or_before = on_or_before;
        self
    }

    pub fn matches(&self, obs: &Observation) -> bool {
        if obs.concept != self.concept {
            return false;
        }
        if let Some(answers) = &self.answers {
            match obs.value_coded() {
                Some(answer) if answers.contains(&answer) => {}
                _ => return false,
            }
        }
        if !self.encounter_types.is_empty() {
            match obs.encounter_type() {
                Some(t) if self.encounter_types.contains(&t) => {}
                _ => return false,
            }
        }
        if !self.locations.is_empty() {
            match obs.location {
                Some(l) if self.locations.contains(&l) => {}
                _ => return false,
            }
        }
        within(obs.obs_date, self.on_or_after, self.on_or_before)
    }
}

/// Filter for an encounter query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncounterQuery {
    pub encounter_types: SmallVec<[EncounterTypeId; 4]>,
    pub locations: SmallVec<[LocationId; 2]>,
    pub on_or_after: Option<NaiveDate>,
    pub on_or_before: Option<NaiveDate>,
}

impl EncounterQuery {
    pub fn of_type(encounter_type: EncounterTypeId) -> Self {
        Self {
            encounter_types: SmallVec::from_slice(&[encounter_type]),
            ..Self::default()
        }
    }

    pub fn location(mut self, location: LocationId) -> Self {
        self.locations.push(location);
        self
    }

    pub fn on_or_before(mut self, date: NaiveDate) -> Self {
        self.on_or_before = Some(date);
        self
    }

    pub fn matches(&self, encounter: &Encounter) -> bool {
        if !self.encounter_types.is_empty() && !self.encounter_types.contains(&encounter.encounter_type) {
            return false;
        }
        if !self.locations.is_empty() {
            match encounter.location {
                Some(l) if self.locations.contains(&l) => {}
                _ => return false,
            }
        }
        within(encounter.encounter_date, self.on_or_after, self.on_or_before)
    }
}

/// Filter for a program enrollment query
#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentQuery {
    pub program: ProgramId,
    pub locations: SmallVec<[LocationId; 2]>,
    pub enrolled_on_or_before: Option<NaiveDate>,
    /// Only enrollments whose active window covers this date
    pub active_on: Option<NaiveDate>,
}

impl EnrollmentQuery {
    pub fn new(program: ProgramId) -> Self {
        Self {
            program,
            locations: SmallVec::new(),
            enrolled_on_or_before: None,
            active_on: None,
        }
    }

    pub fn location(mut self, location: LocationId) -> Self {
        self.locations.push(location);
        self
    }

    pub fn enrolled_on_or_before(mut self, date: NaiveDate) -> Self {
        self.enrolled_on_or_before = Some(date);
        self
    }

    pub fn active_on(mut self, date: NaiveDate) -> Self {
        self.active_on = Some(date);
        self
    }

    pub fn matches(&self, enrollment: &Enrollment) -> bool {
        if enrollment.program != self.program {
            return false;
        }
        if !self.locations.is_empty() {
            match enrollment.location {
                Some(l) if self.locations.contains(&l) => {}
                _ => return false,
            }
        }
        if self.enrolled_on_or_before.is_some_and(|d| enrollment.date_enrolled > d) {
            return false;
        }
        self.active_on.is_none_or(|d| enrollment.is_active_on(d))
    }
}

fn within(date: NaiveDate, on_or_after: Option<NaiveDate>, on_or_before: Option<NaiveDate>) -> bool {
    on_or_after.is_none_or(|start| date >= start) && on_or_before.is_none_or(|end| date <= end)
}
