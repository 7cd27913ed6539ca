//! Identifier newtypes
//!
//! All identifiers are opaque store-native integers. They are kept distinct
//! so a concept id can never be passed where a location id is expected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Unique patient identifier; the unit of iteration for every calculation
    PatientId
);
id_type!(
    /// Concept (question or coded answer) identifier
    ConceptId
);
id_type!(EncounterTypeId);
id_type!(LocationId);
id_type!(ProgramId);
id_type!(
    /// Observation identifier; increases with record creation order
    ObsId
);
id_type!(EncounterId);

/// Deduplicated set of patients, the result of evaluating a cohort
pub type PatientSet = BTreeSet<PatientId>;

/// Build a patient set from raw ids
pub fn patient_set<I: IntoIterator<Item = i64>>(ids: I) -> PatientSet {
    ids.into_iter().map(PatientId).collect()
}
