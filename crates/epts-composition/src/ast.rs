//! Composition expression tree

use epts_diagnostics::Spanned;
use std::fmt;

/// A boolean formula over named searches
#[derive(Debug, Clone, PartialEq)]
pub enum CompositionExpr {
    /// Reference to a registered search, with its position in the source
    Search(Spanned<String>),
    Not(Box<CompositionExpr>),
    And(Box<CompositionExpr>, Box<CompositionExpr>),
    Or(Box<CompositionExpr>, Box<CompositionExpr>),
}

impl CompositionExpr {
    pub fn search(name: impl Into<String>, span: epts_diagnostics::Span) -> Self {
        Self::Search(Spanned::new(name.into(), span))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: Self) -> Self {
        Self::Not(Box::new(operand))
    }

    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    /// Every search reference, in source order, duplicates included
    pub fn searches(&self) -> Vec<&Spanned<String>> {
        let mut found = Vec::new();
        self.collect_searches(&mut found);
        found
    }

    fn collect_searches<'a>(&'a self, found: &mut Vec<&'a Spanned<String>>) {
        match self {
            Self::Search(name) => found.push(name),
            Self::Not(operand) => operand.collect_searches(found),
            Self::And(left, right) | Self::Or(left, right) => {
                left.collect_searches(found);
                right.collect_searches(found);
            }
        }
    }
}

/// Fully parenthesised rendering
impl fmt::Display for CompositionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search(name) => write!(f, "{}", name.inner),
            Self::Not(operand) => write!(f, "NOT {}", operand),
            Self::And(left, right) => write!(f, "({} AND {})", left, right),
            Self::Or(left, right) => write!(f, "({} OR {})", left, right),
        }
    }
}
