//! In-memory observation store
//!
//! Holds a whole dataset in memory and answers gateway queries by scanning
//! it. Used by tests and by the command-line tool, which loads the dataset
//! from a JSON file:
//!
//! ```json
//! {
//!   "people": [{ "id": 1, "gender": "F" }],
//!   "observations": [{ "id": 10, "patient": 1, "concept": 856, "obs_date": "2020-06-01",
//!                      "value": { "type": "numeric", "value": 800.0 } }],
//!   "encounters": [],
//!   "enrollments": []
//! }
//! ```

use crate::provider::{EncounterQuery, EnrollmentQuery, ObsQuery, ObservationStore, PatientRecords};
use crate::records::{Encounter, Enrollment, Observation, Person};
use crate::types::{PatientId, PatientSet};
use epts_diagnostics::{EptsError, Result, EPTS0401, EPTS0402};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Dataset-backed store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryStore {
    #[serde(default)]
    people: Vec<Person>,
    #[serde(default)]
    observations: Vec<Observation>,
    #[serde(default)]
    encounters: Vec<Encounter>,
    #[serde(default)]
    enrollments: Vec<Enrollment>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON dataset
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut store: Self = serde_json::from_str(json).map_err(|e| {
            EptsError::system(EPTS0402, format!("Invalid dataset: {}", e))
        })?;
        store.register_observation_encounters();
        log::debug!(
            "loaded dataset: {} people, {} observations, {} encounters, {} enrollments",
            store.people.len(),
            store.observations.len(),
            store.encounters.len(),
            store.enrollments.len()
        );
        Ok(store)
    }

    /// Read and parse a JSON dataset file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            EptsError::system(EPTS0401, format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn add_person(&mut self, person: Person) -> &mut Self {
        self.people.retain(|p| p.id != person.id);
        self.people.push(person);
        self
    }

    /// Add an observation; its encounter becomes queryable too
    pub fn add_observation(&mut self, obs: Observation) -> &mut Self {
        if let Some(encounter) = &obs.encounter {
            if !self.encounters.iter().any(|e| e.id == encounter.id) {
                self.encounters.push(Encounter {
                    id: encounter.id,
                    patient: obs.patient,
                    encounter_type: encounter.encounter_type,
                    encounter_date: encounter.encounter_date,
                    location: obs.location,
                });
            }
        }
        self.observations.push(obs);
        self
    }

    pub fn add_encounter(&mut self, encounter: Encounter) -> &mut Self {
        self.encounters.retain(|e| e.id != encounter.id);
        self.encounters.push(encounter);
        self
    }

    pub fn add_enrollment(&mut self, enrollment: Enrollment) -> &mut Self {
        self.enrollments.push(enrollment);
        self
    }

    fn register_observation_encounters(&mut self) {
        let observations = std::mem::take(&mut self.observations);
        for obs in observations {
            self.add_observation(obs);
        }
    }
}

fn group<T, K, F>(records: impl Iterator<Item = T>, patient: F, sort_key: K) -> PatientRecords<T>
where
    F: Fn(&T) -> PatientId,
    K: Fn(&T, &T) -> std::cmp::Ordering,
{
    let mut grouped: PatientRecords<T> = BTreeMap::new();
    for record in records {
        grouped.entry(patient(&record)).or_default().push(record);
    }
    for list in grouped.values_mut() {
        list.sort_by(&sort_key);
    }
    grouped
}

impl ObservationStore for InMemoryStore {
    fn observations(&self, query: &ObsQuery, cohort: &PatientSet) -> Result<PatientRecords<Observation>> {
        let matching = self
            .observations
            .iter()
            .filter(|o| cohort.contains(&o.patient) && query.matches(o))
            .cloned();
        Ok(group(matching, |o| o.patient, |a, b| {
            a.obs_date.cmp(&b.obs_date).then(a.id.cmp(&b.id))
        }))
    }

    fn encounters(&self, query: &EncounterQuery, cohort: &PatientSet) -> Result<PatientRecords<Encounter>> {
        let matching = self
            .encounters
            .iter()
            .filter(|e| cohort.contains(&e.patient) && query.matches(e))
            .cloned();
        Ok(group(matching, |e| e.patient, |a, b| {
            a.encounter_date.cmp(&b.encounter_date).then(a.id.cmp(&b.id))
        }))
    }

    fn enrollments(&self, query: &EnrollmentQuery, cohort: &PatientSet) -> Result<PatientRecords<Enrollment>> {
        let matching = self
            .enrollments
            .iter()
            .filter(|e| cohort.contains(&e.patient) && query.matches(e))
            .cloned();
        Ok(group(matching, |e| e.patient, |a, b| a.date_enrolled.cmp(&b.date_enrolled)))
    }

    fn people(&self, cohort: &PatientSet) -> Result<BTreeMap<PatientId, Person>> {
        Ok(self
            .people
            .iter()
            .filter(|p| cohort.contains(&p.id))
            .map(|p| (p.id, p.clone()))
            .collect())
    }

    fn all_patients(&self) -> Result<PatientSet> {
        let mut all: PatientSet = self.people.iter().map(|p| p.id).collect();
        all.extend(self.observations.iter().map(|o| o.patient));
        all.extend(self.encounters.iter().map(|e| e.patient));
        all.extend(self.enrollments.iter().map(|e| e.patient));
        Ok(all)
    }
}
