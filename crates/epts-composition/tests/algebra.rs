//! Property tests: composing sets agrees with evaluating the formula per patient

use chrono::NaiveDate;
use epts_calc::CalculationContext;
use epts_composition::{compose, parse_composition, MappedSearch, Mapping, Searches, StaticCohortDefinition};
use epts_model::{patient_set, ParameterValues, PatientId, PatientSet};
use proptest::prelude::*;
use std::sync::Arc;

const NAMES: [&str; 3] = ["A", "B", "C"];

#[derive(Debug, Clone)]
enum Formula {
    Leaf(usize),
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
}

impl Formula {
    fn holds(&self, membership: &[bool; 3]) -> bool {
        match self {
            Self::Leaf(i) => membership[*i],
            Self::Not(f) => !f.holds(membership),
            Self::And(l, r) => l.holds(membership) && r.holds(membership),
            Self::Or(l, r) => l.holds(membership) || r.holds(membership),
        }
    }

    /// Minimal rendering relying on precedence where it can
    fn render(&self) -> String {
        match self {
            Self::Leaf(i) => NAMES[*i].to_string(),
            Self::Not(f) => format!("NOT ({})", f.render()),
            Self::And(l, r) => format!("({}) and ({})", l.render(), r.render()),
            Self::Or(l, r) => format!("{} OR {}", l.render(), r.render()),
        }
    }
}

fn formula() -> impl Strategy<Value = Formula> {
    let leaf = (0..3usize).prop_map(Formula::Leaf);
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|f| Formula::Not(Box::new(f))),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::And(Box::new(l), Box::new(r))),
            (inner.clone(), inner).prop_map(|(l, r)| Formula::Or(Box::new(l), Box::new(r))),
        ]
    })
}

fn members() -> impl Strategy<Value = PatientSet> {
    prop::collection::btree_set((1i64..=12).prop_map(PatientId), 0..12)
}

fn universe() -> PatientSet {
    patient_set(1..=12)
}

proptest! {
    #[test]
    fn composition_agrees_with_per_patient_logic(
        formula in formula(),
        a in members(),
        b in members(),
        c in members(),
    ) {
        let sets = [a, b, c];
        let searches: Searches = NAMES
            .iter()
            .zip(&sets)
            .map(|(name, set)| {
                let definition = Arc::new(StaticCohortDefinition::new(*name, set.clone()));
                (name.to_string(), MappedSearch::new(definition, Mapping::new()))
            })
            .collect();
        let ctx = CalculationContext::builder(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap())
            .universe(universe())
            .build();

        let found = compose(&formula.render(), &searches, &ParameterValues::new(), &ctx).unwrap();
        let expected: PatientSet = universe()
            .into_iter()
            .filter(|p| formula.holds(&[sets[0].contains(p), sets[1].contains(p), sets[2].contains(p)]))
            .collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn display_reparses_to_the_same_tree(formula in formula()) {
        let parsed = parse_composition(&formula.render()).unwrap();
        let reparsed = parse_composition(&parsed.to_string()).unwrap();
        prop_assert_eq!(parsed.to_string(), reparsed.to_string());
    }
}
