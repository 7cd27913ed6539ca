//! Metadata dictionary
//!
//! Resolves logical names ("hivViralLoad", "adultFollowup") to store-native
//! identifiers. The dictionary is a read-only lookup table supplied at
//! construction time; [`HivMetadata`] resolves everything the calculations
//! need once, so a missing entry fails before any patient is evaluated.

use crate::types::{ConceptId, EncounterTypeId, ProgramId};
use epts_diagnostics::{EptsError, Result, EPTS0104, EPTS0401, EPTS0402};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Logical names understood by [`HivMetadata`]
pub mod names {
    pub const HIV_VIRAL_LOAD: &str = "hivViralLoad";
    pub const REGIMEN: &str = "regimen";
    pub const PREGNANT: &str = "pregnant";
    pub const GESTATION: &str = "gestation";
    pub const NUMBER_OF_WEEKS_PREGNANT: &str = "numberOfWeeksPregnant";
    pub const PREGNANCY_DUE_DATE: &str = "pregnancyDueDate";
    pub const YES: &str = "yes";
    pub const IPT_START_DATE: &str = "iptStartDate";
    pub const IPT_END_DATE: &str = "iptEndDate";
    pub const ISONIAZID_USAGE: &str = "isoniazidUsage";
    pub const ARV_PLAN: &str = "arvPlan";
    pub const START_DRUGS: &str = "startDrugs";
    pub const HISTORICAL_ART_START_DATE: &str = "historicalArtStartDate";

    pub const ADULT_FOLLOWUP: &str = "adultFollowup";
    pub const PEDIATRIC_FOLLOWUP: &str = "pediatricFollowup";
    pub const LABORATORY: &str = "laboratory";
    pub const PHARMACY: &str = "pharmacy";

    pub const PTV_ETV: &str = "ptvEtv";
    pub const ART: &str = "art";
}

/// Logical name to identifier lookup table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataDictionary {
    #[serde(default)]
    concepts: HashMap<String, ConceptId>,
    #[serde(default)]
    encounter_types: HashMap<String, EncounterTypeId>,
    #[serde(default)]
    programs: HashMap<String, ProgramId>,
}

impl MetadataDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| EptsError::system(EPTS0402, format!("Invalid metadata dictionary: {}", e)))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            EptsError::system(EPTS0401, format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn with_concept(mut self, name: impl Into<String>, id: i64) -> Self {
        self.concepts.insert(name.into(), ConceptId(id));
        self
    }

    pub fn with_encounter_type(mut self, name: impl Into<String>, id: i64) -> Self {
        self.encounter_types.insert(name.into(), EncounterTypeId(id));
        self
    }

    pub fn with_program(mut self, name: impl Into<String>, id: i64) -> Self {
        self.programs.insert(name.into(), ProgramId(id));
        self
    }

    pub fn concept(&self, name: &str) -> Result<ConceptId> {
        self.concepts.get(name).copied().ok_or_else(|| unknown("concept", name))
    }

    pub fn encounter_type(&self, name: &str) -> Result<EncounterTypeId> {
        self.encounter_types
            .get(name)
            .copied()
            .ok_or_else(|| unknown("encounter type", name))
    }

    pub fn program(&self, name: &str) -> Result<ProgramId> {
        self.programs.get(name).copied().ok_or_else(|| unknown("program", name))
    }
}

fn unknown(kind: &str, name: &str) -> EptsError {
    EptsError::configuration(EPTS0104, format!("Unknown {} '{}' in metadata dictionary", kind, name))
}

/// Typed identifiers used by the HIV calculations
#[derive(Debug, Clone, PartialEq)]
pub struct HivMetadata {
    pub hiv_viral_load: ConceptId,
    pub regimen: ConceptId,
    pub pregnant: ConceptId,
    pub gestation: ConceptId,
    pub number_of_weeks_pregnant: ConceptId,
    pub pregnancy_due_date: ConceptId,
    pub yes: ConceptId,
    pub ipt_start_date: ConceptId,
    pub ipt_end_date: ConceptId,
    pub isoniazid_usage: ConceptId,
    pub arv_plan: ConceptId,
    pub start_drugs: ConceptId,
    pub historical_art_start_date: ConceptId,

    pub adult_followup: EncounterTypeId,
    pub pediatric_followup: EncounterTypeId,
    pub laboratory: EncounterTypeId,
    pub pharmacy: EncounterTypeId,

    pub ptv_etv_program: ProgramId,
    pub art_program: ProgramId,
}

impl HivMetadata {
    /// Resolve every identifier, failing on the first missing logical name
    pub fn from_dictionary(dict: &MetadataDictionary) -> Result<Self> {
        Ok(Self {
            hiv_viral_load: dict.concept(names::HIV_VIRAL_LOAD)?,
            regimen: dict.concept(names::REGIMEN)?,
            pregnant: dict.concept(names::PREGNANT)?,
            gestation: dict.concept(names::GESTATION)?,
            number_of_weeks_pregnant: dict.concept(names::NUMBER_OF_WEEKS_PREGNANT)?,
            pregnancy_due_date: dict.concept(names::PREGNANCY_DUE_DATE)?,
            yes: dict.concept(names::YES)?,
            ipt_start_date: dict.concept(names::IPT_START_DATE)?,
            ipt_end_date: dict.concept(names::IPT_END_DATE)?,
            isoniazid_usage: dict.concept(names::ISONIAZID_USAGE)?,
            arv_plan: dict.concept(names::ARV_PLAN)?,
            start_drugs: dict.concept(names::START_DRUGS)?,
            historical_art_start_date: dict.concept(names::HISTORICAL_ART_START_DATE)?,
            adult_followup: dict.encounter_type(names::ADULT_FOLLOWUP)?,
            pediatric_followup: dict.encounter_type(names::PEDIATRIC_FOLLOWUP)?,
            laboratory: dict.encounter_type(names::LABORATORY)?,
            pharmacy: dict.encounter_type(names::PHARMACY)?,
            ptv_etv_program: dict.program(names::PTV_ETV)?,
            art_program: dict.program(names::ART)?,
        })
    }

    /// Adult and pediatric follow-up encounter types
    pub fn followup_encounter_types(&self) -> [EncounterTypeId; 2] {
        [self.adult_followup, self.pediatric_followup]
    }
}
