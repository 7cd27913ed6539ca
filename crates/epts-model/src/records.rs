//! Clinical records supplied by the observation store
//!
//! Records are owned by the store; calculations only read them.

use crate::types::{ConceptId, EncounterId, EncounterTypeId, LocationId, ObsId, PatientId, ProgramId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Value carried by an observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ObsValue {
    Numeric(f64),
    Coded(ConceptId),
    Datetime(NaiveDate),
}

/// The encounter an observation was recorded in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterRef {
    pub id: EncounterId,
    pub encounter_type: EncounterTypeId,
    pub encounter_date: NaiveDate,
}

/// A single timestamped clinical fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: ObsId,
    pub patient: PatientId,
    pub concept: ConceptId,
    pub obs_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ObsValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter: Option<EncounterRef>,
}

impl Observation {
    pub fn new(id: i64, patient: PatientId, concept: ConceptId, obs_date: NaiveDate) -> Self {
        Self {
            id: ObsId(id),
            patient,
            concept,
            obs_date,
            value: None,
            location: None,
            encounter: None,
        }
    }

    pub fn with_value(mut self, value: ObsValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_location(mut self, location: LocationId) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_encounter(mut self, encounter: EncounterRef) -> Self {
        self.encounter = Some(encounter);
        self
    }

    pub fn value_numeric(&self) -> Option<f64> {
        match self.value {
            Some(ObsValue::Numeric(n)) => Some(n),
            _ => None,
        }
    }

    pub fn value_coded(&self) -> Option<ConceptId> {
        match self.value {
            Some(ObsValue::Coded(c)) => Some(c),
            _ => None,
        }
    }

    pub fn value_datetime(&self) -> Option<NaiveDate> {
        match self.value {
            Some(ObsValue::Datetime(d)) => Some(d),
            _ => None,
        }
    }

    /// Date of the enclosing encounter, falling back to the observation date
    pub fn encounter_date(&self) -> NaiveDate {
        self.encounter
            .as_ref()
            .map(|e| e.encounter_date)
            .unwrap_or(self.obs_date)
    }

    pub fn encounter_type(&self) -> Option<EncounterTypeId> {
        self.encounter.as_ref().map(|e| e.encounter_type)
    }
}

/// A patient visit of a given type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    pub id: EncounterId,
    pub patient: PatientId,
    pub encounter_type: EncounterTypeId,
    pub encounter_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationId>,
}

/// A patient's participation in a care program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub patient: PatientId,
    pub program: ProgramId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationId>,
    pub date_enrolled: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_completed: Option<NaiveDate>,
}

impl Enrollment {
    /// Whether the enrollment window covers `date`
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.date_enrolled <= date && self.date_completed.is_none_or(|end| end > date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "U")]
    Unknown,
}

/// Demographic record of a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PatientId,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub dead: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_date: Option<NaiveDate>,
}

impl Person {
    pub fn new(id: PatientId, gender: Gender) -> Self {
        Self {
            id,
            gender,
            birthdate: None,
            dead: false,
            death_date: None,
        }
    }

    /// Alive on `date`: not dead, or died after `date`
    pub fn is_alive_on(&self, date: NaiveDate) -> bool {
        !self.dead || self.death_date.is_some_and(|d| d > date)
    }
}
