//! Composition evaluator
//!
//! Evaluates a parsed composition as set algebra over the context universe:
//!
//! | expression | result                   |
//! |------------|--------------------------|
//! | `A`        | members of A in universe |
//! | `NOT A`    | universe \ A             |
//! | `A AND B`  | A ∩ B                    |
//! | `A OR B`   | A ∪ B                    |
//!
//! Every referenced search is checked before anything is evaluated: it must
//! be registered, and its mapping must bind every parameter its definition
//! declares. All mappings are then resolved up front, so a missing or
//! mistyped parameter fails the call whatever the data holds. Each search is
//! evaluated at most once per composition call for a given set of bound
//! parameters.

use crate::ast::CompositionExpr;
use crate::cohort::{check_parameters, CohortDefinition, CohortRef, Parameter};
use crate::mapping::Mapping;
use crate::parser::parse_composition;
use epts_calc::CalculationContext;
use epts_diagnostics::{EptsError, Result, SourceLocation, EPTS0101, EPTS0102, EPTS0106};
use epts_model::{ParameterValues, PatientSet};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

/// A cohort definition registered under a search name, with the mapping
/// that binds its parameters
#[derive(Clone)]
pub struct MappedSearch {
    pub definition: CohortRef,
    pub mapping: Mapping,
}

impl MappedSearch {
    pub fn new(definition: CohortRef, mapping: Mapping) -> Self {
        Self { definition, mapping }
    }
}

/// Registered searches by name
pub type Searches = IndexMap<String, MappedSearch>;

/// Parse and evaluate `composition` against `searches`
pub fn compose(
    composition: &str,
    searches: &Searches,
    params: &ParameterValues,
    ctx: &CalculationContext,
) -> Result<PatientSet> {
    let expression = parse_composition(composition)?;
    compose_parsed(&expression, composition, searches, params, ctx)
}

/// Evaluate an already parsed composition; `source` is used for error locations
pub fn compose_parsed(
    expression: &CompositionExpr,
    source: &str,
    searches: &Searches,
    params: &ParameterValues,
    ctx: &CalculationContext,
) -> Result<PatientSet> {
    validate(expression, source, searches)?;

    let mut evaluator = Evaluator {
        bindings: bind(expression, searches, params, ctx)?,
        ctx,
        memo: HashMap::new(),
    };
    let result = evaluator.eval(expression)?;
    log::debug!(
        "composition '{}': {} of {} patients ({} searches evaluated)",
        source,
        result.len(),
        ctx.universe().len(),
        evaluator.memo.len()
    );
    Ok(result)
}

/// Check that every referenced search is registered and fully mapped.
///
/// Reports every problem found, as [`EptsError::Multiple`] when there is
/// more than one.
pub fn validate(expression: &CompositionExpr, source: &str, searches: &Searches) -> Result<()> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for name in expression.searches() {
        if !seen.insert(name.inner.as_str()) {
            continue;
        }
        let Some(search) = searches.get(&name.inner) else {
            let location = SourceLocation::from_span(name.span, source);
            errors.push(
                EptsError::configuration(EPTS0102, format!("Search '{}' is not registered", name.inner))
                    .with_context(format!("at {} in '{}'", location, source)),
            );
            continue;
        };
        for parameter in search.definition.parameters() {
            if !search.mapping.contains(&parameter.name) {
                errors.push(
                    EptsError::configuration(
                        EPTS0101,
                        format!(
                            "Parameter '{}' of search '{}' has no mapping",
                            parameter.name, name.inner
                        ),
                    )
                    .with_context(format!("mapping was '{}'", search.mapping)),
                );
            }
        }
    }
    EptsError::from_errors(errors).map_or(Ok(()), Err)
}

/// Resolve the mapping of every referenced search and check the result
/// against its definition
fn bind(
    expression: &CompositionExpr,
    searches: &Searches,
    params: &ParameterValues,
    ctx: &CalculationContext,
) -> Result<HashMap<String, Binding>> {
    let mut bindings = HashMap::new();
    for name in expression.searches() {
        if bindings.contains_key(&name.inner) {
            continue;
        }
        let search = searches.get(&name.inner).ok_or_else(|| {
            EptsError::configuration(EPTS0102, format!("Search '{}' is not registered", name.inner))
        })?;
        let bound = search.mapping.resolve(params, ctx)?;
        search.definition.check(&bound, ctx)?;
        bindings.insert(name.inner.clone(), (search.definition.clone(), bound));
    }
    Ok(bindings)
}

/// A search's definition with its resolved parameters
type Binding = (CohortRef, ParameterValues);

struct Evaluator<'a> {
    bindings: HashMap<String, Binding>,
    ctx: &'a CalculationContext,
    memo: HashMap<String, PatientSet>,
}

impl Evaluator<'_> {
    fn eval(&mut self, expression: &CompositionExpr) -> Result<PatientSet> {
        match expression {
            CompositionExpr::Search(name) => self.search(&name.inner),
            CompositionExpr::Not(operand) => {
                let excluded = self.eval(operand)?;
                Ok(self.ctx.universe().difference(&excluded).copied().collect())
            }
            CompositionExpr::And(left, right) => {
                let left = self.eval(left)?;
                // every mapping was resolved by `bind`, so skipping the right side hides no error
                if left.is_empty() {
                    return Ok(left);
                }
                let right = self.eval(right)?;
                Ok(left.intersection(&right).copied().collect())
            }
            CompositionExpr::Or(left, right) => {
                let mut left = self.eval(left)?;
                left.extend(self.eval(right)?);
                Ok(left)
            }
        }
    }

    fn search(&mut self, name: &str) -> Result<PatientSet> {
        let (definition, bound) = self.bindings.get(name).ok_or_else(|| {
            EptsError::configuration(EPTS0102, format!("Search '{}' is not registered", name))
        })?;

        let key = memo_key(name, bound);
        if let Some(found) = self.memo.get(&key) {
            return Ok(found.clone());
        }

        let found: PatientSet = definition
            .evaluate(bound, self.ctx)?
            .intersection(self.ctx.universe())
            .copied()
            .collect();
        self.memo.insert(key, found.clone());
        Ok(found)
    }
}

fn memo_key(name: &str, bound: &ParameterValues) -> String {
    let mut key = name.to_string();
    for (param, value) in bound {
        let _ = write!(key, "|{}={}", param, value);
    }
    key
}

/// A cohort defined as a composition of other cohorts.
///
/// ```
/// use epts_composition::{CompositionCohortDefinition, StaticCohortDefinition};
/// use std::sync::Arc;
///
/// let mut txnew = CompositionCohortDefinition::new("txNew", "startedArt NOT transferredIn").unwrap();
/// txnew
///     .add_search("startedArt", Arc::new(StaticCohortDefinition::new("a", Default::default())), "")
///     .unwrap()
///     .add_search("transferredIn", Arc::new(StaticCohortDefinition::new("b", Default::default())), "")
///     .unwrap();
/// assert!(txnew.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct CompositionCohortDefinition {
    name: String,
    composition: String,
    expression: CompositionExpr,
    searches: Searches,
    parameters: Vec<Parameter>,
}

impl CompositionCohortDefinition {
    pub fn new(name: impl Into<String>, composition: impl Into<String>) -> Result<Self> {
        let composition = composition.into();
        let expression = parse_composition(&composition)?;
        Ok(Self {
            name: name.into(),
            composition,
            expression,
            searches: Searches::new(),
            parameters: Vec::new(),
        })
    }

    /// Register `definition` under `name`, binding its parameters with
    /// `mapping` (e.g. `"onOrBefore=${endDate},location=${location}"`)
    pub fn add_search(&mut self, name: impl Into<String>, definition: CohortRef, mapping: &str) -> Result<&mut Self> {
        let mapping = Mapping::parse(mapping)?;
        self.add_mapped_search(name, MappedSearch::new(definition, mapping))
    }

    pub fn add_mapped_search(&mut self, name: impl Into<String>, search: MappedSearch) -> Result<&mut Self> {
        let name = name.into();
        if self.searches.contains_key(&name) {
            return Err(EptsError::configuration(
                EPTS0106,
                format!("Search '{}' is already registered in '{}'", name, self.name),
            ));
        }
        self.searches.insert(name, search);
        Ok(self)
    }

    pub fn add_parameter(&mut self, parameter: Parameter) -> &mut Self {
        self.parameters.push(parameter);
        self
    }

    pub fn composition(&self) -> &str {
        &self.composition
    }

    pub fn expression(&self) -> &CompositionExpr {
        &self.expression
    }

    pub fn searches(&self) -> &Searches {
        &self.searches
    }

    /// Check registration and mapping coverage without evaluating anything
    pub fn validate(&self) -> Result<()> {
        validate(&self.expression, &self.composition, &self.searches)
    }
}

impl CohortDefinition for CompositionCohortDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn check(&self, params: &ParameterValues, ctx: &CalculationContext) -> Result<()> {
        check_parameters(&self.name, &self.parameters, params)?;
        validate(&self.expression, &self.composition, &self.searches)?;
        bind(&self.expression, &self.searches, params, ctx).map(|_| ())
    }

    fn evaluate(&self, params: &ParameterValues, ctx: &CalculationContext) -> Result<PatientSet> {
        check_parameters(&self.name, &self.parameters, params)?;
        compose_parsed(&self.expression, &self.composition, &self.searches, params, ctx)
    }
}
