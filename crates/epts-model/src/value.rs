//! Parameter values
//!
//! Report-wide parameters (start date, end date, location) and calculation
//! parameters share one value type so they can flow from a composition down
//! into the calculations it wraps.

use crate::types::LocationId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named parameter values, ordered by name
pub type ParameterValues = BTreeMap<String, ParamValue>;

/// A parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Boolean(bool),
    Integer(i64),
    Date(NaiveDate),
    Locations(Vec<LocationId>),
    Text(String),
}

impl ParamValue {
    /// Parse a literal as written in a parameter mapping or on the command line.
    ///
    /// `2020-01-31` becomes a date, `true`/`false` a boolean, digits an
    /// integer, anything else text.
    pub fn parse_literal(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Self::Date(date);
        }
        match raw {
            "true" => return Self::Boolean(true),
            "false" => return Self::Boolean(false),
            _ => {}
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Self::Integer(i);
        }
        Self::Text(raw.to_string())
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// A location given either as a bare id or as a one-element location list
    pub fn as_location(&self) -> Option<LocationId> {
        match self {
            Self::Integer(i) => Some(LocationId(*i)),
            Self::Locations(list) => list.first().copied(),
            _ => None,
        }
    }

    pub fn as_locations(&self) -> Option<Vec<LocationId>> {
        match self {
            Self::Integer(i) => Some(vec![LocationId(*i)]),
            Self::Locations(list) => Some(list.clone()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "Boolean",
            Self::Integer(_) => "Integer",
            Self::Date(_) => "Date",
            Self::Locations(_) => "Location",
            Self::Text(_) => "Text",
        }
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<LocationId> for ParamValue {
    fn from(location: LocationId) -> Self {
        Self::Locations(vec![location])
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Locations(list) => {
                let ids: Vec<String> = list.iter().map(|l| l.to_string()).collect();
                write!(f, "[{}]", ids.join(","))
            }
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}
