//! Parameter mappings
//!
//! A mapping tells a registered search how to obtain each of its own
//! parameters from the parameters of the enclosing composition:
//!
//! ```text
//! onOrAfter=${startDate},onOrBefore=${endDate-1d},location=${location},months=6
//! ```
//!
//! A value is a `${name}` reference, a reference shifted by a calendar
//! offset (units `d`, `w`, `m`, `y`), or a literal parsed with
//! [`ParamValue::parse_literal`]. An empty mapping maps nothing.

use chrono::{Days, NaiveDate};
use epts_calc::temporal::add_months;
use epts_calc::CalculationContext;
use epts_diagnostics::{EptsError, Result, Span, EPTS0005, EPTS0006, EPTS0100, EPTS0103};
use epts_model::{ParamValue, ParameterValues};
use indexmap::IndexMap;
use std::fmt;
use winnow::ascii::{digit1, multispace0};
use winnow::combinator::{alt, cut_err, opt, separated};
use winnow::error::{ContextError, StrContext};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};
use winnow::ModalResult;

type Input<'s> = &'s str;

const OFFSET: &str = "date offset";
const REFERENCE: &str = "closing brace";
const EQUALS: &str = "'='";

/// Calendar unit of a date offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl OffsetUnit {
    fn symbol(self) -> char {
        match self {
            Self::Days => 'd',
            Self::Weeks => 'w',
            Self::Months => 'm',
            Self::Years => 'y',
        }
    }
}

/// A signed calendar offset such as `-12m`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateOffset {
    pub amount: i32,
    pub unit: OffsetUnit,
}

impl DateOffset {
    pub const fn new(amount: i32, unit: OffsetUnit) -> Self {
        Self { amount, unit }
    }

    /// Shift `date`; `None` when the result leaves the calendar range
    pub fn apply(&self, date: NaiveDate) -> Option<NaiveDate> {
        let shift_days = |n: i64| {
            if n >= 0 {
                date.checked_add_days(Days::new(n.unsigned_abs()))
            } else {
                date.checked_sub_days(Days::new(n.unsigned_abs()))
            }
        };
        match self.unit {
            OffsetUnit::Days => shift_days(i64::from(self.amount)),
            OffsetUnit::Weeks => shift_days(i64::from(self.amount) * 7),
            OffsetUnit::Months => Some(add_months(date, self.amount)),
            OffsetUnit::Years => self.amount.checked_mul(12).map(|months| add_months(date, months)),
        }
    }
}

impl fmt::Display for DateOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}{}", self.amount, self.unit.symbol())
    }
}

/// Right-hand side of one mapping entry
#[derive(Debug, Clone, PartialEq)]
pub enum MappedValue {
    Reference { name: String, offset: Option<DateOffset> },
    Literal(ParamValue),
}

impl MappedValue {
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference {
            name: name.into(),
            offset: None,
        }
    }

    fn resolve(&self, key: &str, params: &ParameterValues, ctx: &CalculationContext) -> Result<ParamValue> {
        let (name, offset) = match self {
            Self::Literal(value) => return Ok(value.clone()),
            Self::Reference { name, offset } => (name, offset),
        };
        let value = ctx.parameter(params, name).ok_or_else(|| {
            EptsError::configuration(
                EPTS0100,
                format!("Missing parameter '{}' needed by mapping '{}'", name, key),
            )
        })?;
        let Some(offset) = offset else {
            return Ok(value.clone());
        };
        let date = value.as_date().ok_or_else(|| {
            EptsError::configuration(
                EPTS0103,
                format!(
                    "Cannot shift parameter '{}' by {}: it is a {}, not a Date",
                    name,
                    offset,
                    value.type_name()
                ),
            )
        })?;
        offset.apply(date).map(ParamValue::Date).ok_or_else(|| {
            EptsError::configuration(
                EPTS0103,
                format!("Shifting '{}' ({}) by {} leaves the calendar", name, date, offset),
            )
        })
    }
}

impl fmt::Display for MappedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference { name, offset: None } => write!(f, "${{{}}}", name),
            Self::Reference {
                name,
                offset: Some(offset),
            } => write!(f, "${{{}{}}}", name, offset),
            Self::Literal(value) => write!(f, "{}", value),
        }
    }
}

/// Parameter mapping of one registered search, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: IndexMap<String, MappedValue>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `key=value,key=value` form
    pub fn parse(source: &str) -> Result<Self> {
        let parsed = entries
            .parse(source)
            .map_err(|e| mapping_error(source, e.offset(), e.inner()))?;

        let mut mapping = Self::new();
        for (key, value) in parsed {
            if mapping.entries.contains_key(&key) {
                return Err(EptsError::parse(
                    EPTS0005,
                    format!("Parameter '{}' is mapped more than once", key),
                    source,
                ));
            }
            mapping.entries.insert(key, value);
        }
        Ok(mapping)
    }

    pub fn with(mut self, key: impl Into<String>, value: MappedValue) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&MappedValue> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind every mapped parameter against the composition's parameters,
    /// falling back to the ambient cache of the context
    pub fn resolve(&self, params: &ParameterValues, ctx: &CalculationContext) -> Result<ParameterValues> {
        self.entries
            .iter()
            .map(|(key, value)| Ok((key.clone(), value.resolve(key, params, ctx)?)))
            .collect()
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Mapping {
    type Err = EptsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ============================================================================
// Grammar
// ============================================================================

fn ws(input: &mut Input<'_>) -> ModalResult<()> {
    multispace0.void().parse_next(input)
}

fn identifier<'s>(input: &mut Input<'s>) -> ModalResult<&'s str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.'),
    )
        .take()
        .parse_next(input)
}

fn entries(input: &mut Input<'_>) -> ModalResult<Vec<(String, MappedValue)>> {
    ws(input)?;
    if input.is_empty() {
        return Ok(Vec::new());
    }
    separated(1.., entry, ',').parse_next(input)
}

fn entry(input: &mut Input<'_>) -> ModalResult<(String, MappedValue)> {
    ws(input)?;
    let key = identifier.parse_next(input)?;
    ws(input)?;
    cut_err(equals).context(StrContext::Label(EQUALS)).parse_next(input)?;
    ws(input)?;
    let value = value.parse_next(input)?;
    ws(input)?;
    Ok((key.to_string(), value))
}

fn equals(input: &mut Input<'_>) -> ModalResult<char> {
    '='.parse_next(input)
}

fn open_reference<'s>(input: &mut Input<'s>) -> ModalResult<&'s str> {
    "${".parse_next(input)
}

fn close_reference(input: &mut Input<'_>) -> ModalResult<char> {
    '}'.parse_next(input)
}

fn value(input: &mut Input<'_>) -> ModalResult<MappedValue> {
    if opt(open_reference).parse_next(input)?.is_some() {
        ws(input)?;
        let name = cut_err(identifier)
            .context(StrContext::Label(REFERENCE))
            .parse_next(input)?;
        ws(input)?;
        let offset = opt(offset).parse_next(input)?;
        ws(input)?;
        cut_err(close_reference)
            .context(StrContext::Label(REFERENCE))
            .parse_next(input)?;
        return Ok(MappedValue::Reference {
            name: name.to_string(),
            offset,
        });
    }
    let raw = literal.parse_next(input)?;
    Ok(MappedValue::Literal(ParamValue::parse_literal(raw)))
}

fn literal<'s>(input: &mut Input<'s>) -> ModalResult<&'s str> {
    take_till(1.., ',').parse_next(input)
}

fn sign(input: &mut Input<'_>) -> ModalResult<i32> {
    alt(('+'.value(1), '-'.value(-1))).parse_next(input)
}

fn amount(input: &mut Input<'_>) -> ModalResult<i32> {
    digit1.parse_to().parse_next(input)
}

fn unit(input: &mut Input<'_>) -> ModalResult<OffsetUnit> {
    alt((
        'd'.value(OffsetUnit::Days),
        'w'.value(OffsetUnit::Weeks),
        'm'.value(OffsetUnit::Months),
        'y'.value(OffsetUnit::Years),
    ))
    .parse_next(input)
}

fn offset(input: &mut Input<'_>) -> ModalResult<DateOffset> {
    let sign = sign.parse_next(input)?;
    ws(input)?;
    let amount = cut_err(amount).context(StrContext::Label(OFFSET)).parse_next(input)?;
    let unit = cut_err(unit).context(StrContext::Label(OFFSET)).parse_next(input)?;
    Ok(DateOffset::new(sign * amount, unit))
}

fn mapping_error(source: &str, offset: usize, err: &ContextError) -> EptsError {
    let labels: Vec<&str> = err
        .context()
        .filter_map(|c| match c {
            StrContext::Label(label) => Some(*label),
            _ => None,
        })
        .collect();
    let found = source
        .get(offset..)
        .and_then(|rest| rest.chars().next())
        .map_or_else(|| "end of mapping".to_string(), |c| format!("'{}'", c));
    let span = Span::new(offset, (offset + 1).min(source.len()));

    if labels.contains(&OFFSET) {
        return EptsError::parse_at(
            EPTS0006,
            format!("Invalid date offset: expected a number followed by d, w, m or y but found {}", found),
            source,
            span,
        );
    }
    let expected = labels.first().copied().unwrap_or("parameter name");
    EptsError::parse_at(
        EPTS0005,
        format!("Invalid parameter mapping: expected {} but found {}", expected, found),
        source,
        span,
    )
}
