//! EPTS error types

use crate::{ErrorCode, SourceLocation, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// An error ready for display, with location and help
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            location: None,
            help: None,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render the diagnostic for a terminal, pointing at the offending span
    /// of `source` when a location is known.
    pub fn render(&self, source: Option<&str>) -> String {
        let mut out = self.header();
        if let (Some(loc), Some(source)) = (&self.location, source) {
            let line_text = source.lines().nth(loc.line.saturating_sub(1)).unwrap_or("");
            let marker = format!(
                "{}{}",
                " ".repeat(loc.column.saturating_sub(1)),
                "^".repeat(loc.length.max(1))
            );
            out.push_str(&format!("\n  | {}\n  | {}", line_text, marker));
        }
        let help = self.help.as_deref().or(self.code.info().help);
        if let Some(help) = help {
            out.push_str(&format!("\n  = help: {}", help));
        }
        out
    }

    #[cfg(feature = "colored")]
    fn header(&self) -> String {
        use colored::Colorize;
        format!("{}[{}]: {}", "error".red().bold(), self.code, self.message)
    }

    #[cfg(not(feature = "colored"))]
    fn header(&self) -> String {
        format!("error[{}]: {}", self.code, self.message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {} - {}", self.code, self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " at {}", loc)?;
        }
        Ok(())
    }
}

/// Main EPTS error type
///
/// Absence of clinical evidence is never an error; these variants cover
/// malformed definitions, missing configuration and store failures only.
#[derive(Debug, Clone, Error)]
pub enum EptsError {
    /// Malformed composition string or parameter mapping
    #[error("{code}: {message}")]
    Parse {
        code: ErrorCode,
        message: String,
        expression: String,
        location: Option<SourceLocation>,
    },

    /// Missing ambient parameter, unmapped search parameter, unregistered
    /// search name or unresolvable metadata
    #[error("{code}: {message}")]
    Configuration {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Failure reported by the observation store gateway
    #[error("{code}: {message}")]
    DataAccess {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// I/O or input-format failure outside the engine proper
    #[error("{code}: {message}")]
    System {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Independent problems found in one validation pass
    #[error("{} errors", .0.len())]
    Multiple(Vec<EptsError>),
}

impl EptsError {
    pub fn parse(code: ErrorCode, message: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::Parse {
            code,
            message: message.into(),
            expression: expression.into(),
            location: None,
        }
    }

    /// Create a parse error located at `span` within `expression`
    pub fn parse_at(
        code: ErrorCode,
        message: impl Into<String>,
        expression: impl Into<String>,
        span: Span,
    ) -> Self {
        let expression = expression.into();
        let location = SourceLocation::from_span(span, &expression);
        Self::Parse {
            code,
            message: message.into(),
            expression,
            location: Some(location),
        }
    }

    pub fn configuration(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Configuration {
            code,
            message: message.into(),
            context: None,
        }
    }

    pub fn data_access(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::DataAccess {
            code,
            message: message.into(),
            context: None,
        }
    }

    pub fn system(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::System {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// `None` for no errors, the error itself for one, `Multiple` otherwise
    pub fn from_errors(mut errors: Vec<EptsError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// The individual errors: the collected ones for `Multiple`, else just `self`
    pub fn errors(&self) -> &[EptsError] {
        match self {
            Self::Multiple(errors) => errors,
            _ => std::slice::from_ref(self),
        }
    }

    /// Attach context (which search, which calculation) to the error
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        match &mut self {
            Self::Configuration { context, .. }
            | Self::DataAccess { context, .. }
            | Self::System { context, .. } => *context = Some(ctx.into()),
            Self::Parse { .. } | Self::Multiple(_) => {}
        }
        self
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Parse { code, .. } => *code,
            Self::Configuration { code, .. } => *code,
            Self::DataAccess { code, .. } => *code,
            Self::System { code, .. } => *code,
            Self::Multiple(errors) => errors.first().map_or(crate::EPTS0400, Self::code),
        }
    }

    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Multiple(errors) => errors.iter().all(Self::is_configuration),
            _ => matches!(self, Self::Configuration { .. }),
        }
    }

    pub fn is_data_access(&self) -> bool {
        matches!(self, Self::DataAccess { .. })
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Parse { location, .. } => location.as_ref(),
            _ => None,
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Parse { code, message, location, .. } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(loc) = location {
                    diag = diag.with_location(loc.clone());
                }
                diag
            }
            Self::Configuration { code, message, context }
            | Self::DataAccess { code, message, context }
            | Self::System { code, message, context } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(ctx) = context {
                    diag = diag.with_help(ctx.clone());
                }
                diag
            }
            Self::Multiple(errors) => match errors.first() {
                Some(first) => first.to_diagnostic(),
                None => Diagnostic::error(crate::EPTS0400, "No errors collected"),
            },
        }
    }
}
