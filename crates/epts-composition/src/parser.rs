//! Composition expression parser
//!
//! Recursive descent with one function per precedence level:
//!
//! ```text
//! or     := and ( OR and )*
//! and    := unary ( AND unary | NOT unary )*
//! unary  := NOT unary | primary
//! primary:= '(' or ')' | search-name
//! ```
//!
//! `A NOT B` is shorthand for `A AND NOT B`. Keywords are case-insensitive
//! and cannot be used as search names.

use crate::ast::CompositionExpr;
use epts_diagnostics::{EptsError, Result, Span, EPTS0001, EPTS0002, EPTS0003, EPTS0004};
use winnow::ascii::multispace0;
use winnow::combinator::{cut_err, opt};
use winnow::error::{ContextError, StrContext};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};
use winnow::ModalResult;

type Input<'s> = &'s str;

const KEYWORDS: [&str; 3] = ["and", "or", "not"];

const SEARCH_NAME: &str = "search name";
const CLOSE_PAREN: &str = "closing parenthesis";

/// Parse a composition string such as `"A AND NOT (B OR C)"`
pub fn parse_composition(source: &str) -> Result<CompositionExpr> {
    let parser = CompositionParser { source };
    let mut expression = |input: &mut Input<'_>| parser.expression(input);
    expression
        .parse(source)
        .map_err(|e| parse_error(source, e.offset(), e.inner()))
}

fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| word.eq_ignore_ascii_case(k))
}

fn ws(input: &mut Input<'_>) -> ModalResult<()> {
    multispace0.void().parse_next(input)
}

fn word<'s>(input: &mut Input<'s>) -> ModalResult<&'s str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

fn search_name<'s>(input: &mut Input<'s>) -> ModalResult<&'s str> {
    word.verify(|w: &str| !is_keyword(w)).parse_next(input)
}

/// A whole-word keyword, optionally preceded by whitespace
fn keyword<'s>(kw: &'static str) -> impl FnMut(&mut Input<'s>) -> ModalResult<()> {
    move |input: &mut Input<'s>| {
        ws(input)?;
        word.verify(|w: &str| w.eq_ignore_ascii_case(kw)).void().parse_next(input)
    }
}

fn open_paren(input: &mut Input<'_>) -> ModalResult<char> {
    '('.parse_next(input)
}

fn close_paren(input: &mut Input<'_>) -> ModalResult<char> {
    ')'.parse_next(input)
}

struct CompositionParser<'s> {
    source: &'s str,
}

impl CompositionParser<'_> {
    fn offset(&self, input: &Input<'_>) -> usize {
        self.source.len() - input.len()
    }

    fn expression(&self, input: &mut Input<'_>) -> ModalResult<CompositionExpr> {
        let expr = self.or_expression(input)?;
        ws(input)?;
        Ok(expr)
    }

    fn or_expression(&self, input: &mut Input<'_>) -> ModalResult<CompositionExpr> {
        let mut left = self.and_expression(input)?;
        while opt(keyword("or")).parse_next(input)?.is_some() {
            let right = self.and_expression(input)?;
            left = CompositionExpr::or(left, right);
        }
        Ok(left)
    }

    fn and_expression(&self, input: &mut Input<'_>) -> ModalResult<CompositionExpr> {
        let mut left = self.unary_expression(input)?;
        loop {
            if opt(keyword("and")).parse_next(input)?.is_some() {
                let right = self.unary_expression(input)?;
                left = CompositionExpr::and(left, right);
            } else if opt(keyword("not")).parse_next(input)?.is_some() {
                let right = self.unary_expression(input)?;
                left = CompositionExpr::and(left, CompositionExpr::not(right));
            } else {
                return Ok(left);
            }
        }
    }

    fn unary_expression(&self, input: &mut Input<'_>) -> ModalResult<CompositionExpr> {
        if opt(keyword("not")).parse_next(input)?.is_some() {
            let operand = self.unary_expression(input)?;
            return Ok(CompositionExpr::not(operand));
        }
        self.primary_expression(input)
    }

    fn primary_expression(&self, input: &mut Input<'_>) -> ModalResult<CompositionExpr> {
        ws(input)?;
        if opt(open_paren).parse_next(input)?.is_some() {
            let inner = self.or_expression(input)?;
            ws(input)?;
            cut_err(close_paren)
                .context(StrContext::Label(CLOSE_PAREN))
                .parse_next(input)?;
            return Ok(inner);
        }
        let start = self.offset(input);
        let name = cut_err(search_name)
            .context(StrContext::Label(SEARCH_NAME))
            .parse_next(input)?;
        Ok(CompositionExpr::search(name, Span::new(start, self.offset(input))))
    }
}

/// The token starting at `offset`: a word, or a single character
fn token_at(source: &str, offset: usize) -> &str {
    let rest = source.get(offset..).unwrap_or_default();
    let word_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if word_len > 0 {
        &rest[..word_len]
    } else {
        rest.chars().next().map_or("", |c| &rest[..c.len_utf8()])
    }
}

fn parse_error(source: &str, offset: usize, err: &ContextError) -> EptsError {
    let label = err.context().find_map(|c| match c {
        StrContext::Label(label) => Some(*label),
        _ => None,
    });
    let token = token_at(source, offset);
    let span = Span::new(offset, offset + token.len());

    if label == Some(CLOSE_PAREN) {
        let found = if token.is_empty() { "end of expression".to_string() } else { format!("'{}'", token) };
        return EptsError::parse_at(EPTS0004, format!("Expected ')' but found {}", found), source, span);
    }
    if token.is_empty() {
        return EptsError::parse_at(EPTS0002, "Unexpected end of expression", source, Span::point(offset));
    }
    if label == Some(SEARCH_NAME) {
        return EptsError::parse_at(
            EPTS0003,
            format!("Expected a search name but found '{}'", token),
            source,
            span,
        );
    }
    EptsError::parse_at(EPTS0001, format!("Unexpected '{}'", token), source, span)
}
