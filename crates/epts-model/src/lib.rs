//! EPTS clinical data model
//!
//! This crate provides:
//! - Identifier newtypes for patients, concepts, encounter types, locations and programs
//! - Observation, encounter, enrollment and demographic records
//! - Parameter values shared by calculations and cohort compositions
//! - The `ObservationStore` gateway trait and its query filters
//! - An in-memory store used by tests and the command-line tool
//! - The metadata dictionary resolving logical names to store identifiers

pub mod memory;
pub mod metadata;
pub mod provider;
pub mod records;
pub mod types;
pub mod value;

pub use memory::*;
pub use metadata::*;
pub use provider::*;
pub use records::*;
pub use types::*;
pub use value::*;
