//! Per-patient calculation results

use chrono::NaiveDate;
use epts_model::{Observation, PatientId, PatientSet};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// The fact derived for one patient
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FactValue {
    Boolean(bool),
    Date(Option<NaiveDate>),
    Observations(Vec<Observation>),
}

impl FactValue {
    /// Whether the fact counts as evidence: `true`, a present date, or a
    /// non-empty observation list
    pub fn passes(&self) -> bool {
        match self {
            Self::Boolean(b) => *b,
            Self::Date(d) => d.is_some(),
            Self::Observations(list) => !list.is_empty(),
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => *d,
            _ => None,
        }
    }

    pub fn as_observations(&self) -> &[Observation] {
        match self {
            Self::Observations(list) => list,
            _ => &[],
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Date(Some(d)) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Date(None) => write!(f, "null"),
            Self::Observations(list) => write!(f, "{} observation(s)", list.len()),
        }
    }
}

/// Mapping from patient to derived fact.
///
/// Built with [`FactResult::for_cohort`] so that every cohort patient has an
/// entry holding the negative default until a calculation overwrites it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FactResult {
    entries: BTreeMap<PatientId, FactValue>,
}

impl FactResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// One `default` entry per cohort patient
    pub fn for_cohort(cohort: &PatientSet, default: FactValue) -> Self {
        Self {
            entries: cohort.iter().map(|p| (*p, default.clone())).collect(),
        }
    }

    pub fn insert(&mut self, patient: PatientId, value: FactValue) {
        self.entries.insert(patient, value);
    }

    pub fn get(&self, patient: PatientId) -> Option<&FactValue> {
        self.entries.get(&patient)
    }

    /// Date held for `patient`, if any
    pub fn date(&self, patient: PatientId) -> Option<NaiveDate> {
        self.get(patient).and_then(FactValue::as_date)
    }

    pub fn is_true(&self, patient: PatientId) -> bool {
        self.get(patient).is_some_and(FactValue::passes)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn patients(&self) -> PatientSet {
        self.entries.keys().copied().collect()
    }

    /// Patients whose fact passes
    pub fn patients_that_pass(&self) -> PatientSet {
        self.entries
            .iter()
            .filter(|(_, v)| v.passes())
            .map(|(p, _)| *p)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatientId, &FactValue)> {
        self.entries.iter().map(|(p, v)| (*p, v))
    }
}

impl<'a> IntoIterator for &'a FactResult {
    type Item = (&'a PatientId, &'a FactValue);
    type IntoIter = std::collections::btree_map::Iter<'a, PatientId, FactValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
