//! Koan Error Handling - Unified Encapsulated API
//!
//! Every failure mode of the parse pipeline is represented by one error
//! struct carrying a kind, source information, and diagnostic enhancements.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use thiserror::Error;

// ============================================================================
// SOURCE CONTEXT - Error reporting infrastructure
// ============================================================================

/// Represents source context for error reporting with explicit hierarchy
/// between real sources (preferred) and fallbacks (tolerated when necessary)
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real source content.
    /// This is the preferred method for error reporting.
    pub fn from_source(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Create a fallback when real source is unavailable.
    /// Use only when real source cannot be obtained.
    pub fn fallback(context: &str) -> Self {
        Self {
            name: "fallback".to_string(),
            content: format!("// {}", context),
        }
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

impl Default for SourceContext {
    fn default() -> Self {
        Self::fallback("default context")
    }
}

/// The single error type - no wrapper, no variants, just essential data
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct KoanError {
    /// What went wrong (type-specific data)
    pub kind: ErrorKind,
    /// Where it happened (context-specific source information)
    pub source_info: SourceInfo,
    /// How to help (auto-populated based on context)
    pub diagnostic_info: DiagnosticInfo,
}

/// All error types as a clean enum - no duplicate fields
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    // Lexical errors - no rule matched at the current position
    #[error("Lex error: unrecognized input at line {line}, column {column}")]
    UnrecognizedInput { line: u32, column: u32, offset: usize },

    // Structural errors - programming-invariant violations in the tree builder
    #[error("Structural error: missing required ancestor ({wanted}) from {at}")]
    MissingAncestor { wanted: String, at: String },

    // Expansion errors - structurally valid input the compiler cannot resolve
    #[error("Expansion error: no expansion defined for marker '{marker}'")]
    UnsupportedMarker { marker: String },
}

/// Context-specific source information
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
    pub phase: String,
}

/// Diagnostic enhancement data
#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

impl ErrorKind {
    /// Get the error category for test assertions
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnrecognizedInput { .. } => ErrorCategory::Lex,
            Self::MissingAncestor { .. } => ErrorCategory::Structural,
            Self::UnsupportedMarker { .. } => ErrorCategory::Expansion,
        }
    }

    /// Get error code suffix for diagnostic codes
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::UnrecognizedInput { .. } => "unrecognized_input",
            Self::MissingAncestor { .. } => "missing_ancestor",
            Self::UnsupportedMarker { .. } => "unsupported_marker",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lex,
    Structural,
    Expansion,
}

impl Diagnostic for KoanError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.primary_label()),
            self.source_info.primary_span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.source_info.source)
    }
}

impl KoanError {
    fn primary_label(&self) -> String {
        match &self.kind {
            ErrorKind::UnrecognizedInput { .. } => "no lexical rule matches here".into(),
            ErrorKind::MissingAncestor { .. } => "builder invariant violated here".into(),
            ErrorKind::UnsupportedMarker { .. } => "marker has no expansion".into(),
        }
    }
}

/// Context-aware error creation - each phase knows how to create appropriate errors
pub trait ErrorReporting {
    /// Create an error with context-appropriate enhancements
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> KoanError;

    /// Creates an internal error - these indicate engine bugs, not user errors.
    /// Use this for situations that should never happen in correct operation.
    fn internal_error(&self, wanted: &str, at: &str, span: SourceSpan) -> KoanError {
        let mut error = self.report(
            ErrorKind::MissingAncestor {
                wanted: wanted.into(),
                at: at.into(),
            },
            span,
        );
        error.diagnostic_info.help =
            Some("This is an internal parser error. Please report this as a bug.".into());
        error
    }
}

/// General-purpose error creation context used throughout the pipeline
/// for creating properly contextualized KoanError instances
pub struct PhaseContext {
    pub source: SourceContext,
    pub phase: String,
}

impl PhaseContext {
    pub fn new(source: SourceContext, phase: impl Into<String>) -> Self {
        Self {
            source,
            phase: phase.into(),
        }
    }
}

impl ErrorReporting for PhaseContext {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> KoanError {
        let error_code = format!("koan::{}::{}", self.phase, kind.code_suffix());

        KoanError {
            kind,
            source_info: SourceInfo {
                source: self.source.to_named_source(),
                primary_span: span,
                phase: self.phase.clone(),
            },
            diagnostic_info: DiagnosticInfo {
                help: None,
                error_code,
            },
        }
    }
}

/// Creates a placeholder span for errors not tied to a specific source code
/// location. This makes the intent of using an empty span explicit and searchable.
pub fn unspanned() -> SourceSpan {
    SourceSpan::from(0..0)
}

/// Converts a half-open byte range to a miette SourceSpan.
pub fn to_source_span(start: usize, end: usize) -> SourceSpan {
    SourceSpan::from(start..end.max(start))
}

// ============================================================================
// ERROR FORMATTING UTILITIES
// ============================================================================

/// Prints a KoanError with full miette diagnostics
///
/// This provides rich error formatting with source spans, suggestions, and
/// context. Use this for user-facing error display.
pub fn print_error(error: KoanError) {
    use miette::Report;
    let report = Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_carry_phase_and_suffix() {
        let ctx = PhaseContext::new(SourceContext::from_source("test", "foo ~bar"), "tokenize");
        let err = ctx.report(
            ErrorKind::UnrecognizedInput {
                line: 1,
                column: 5,
                offset: 4,
            },
            to_source_span(4, 5),
        );
        assert_eq!(
            err.diagnostic_info.error_code,
            "koan::tokenize::unrecognized_input"
        );
        assert_eq!(err.kind.category(), ErrorCategory::Lex);
    }

    #[test]
    fn test_report_renders_source_span() {
        let ctx = PhaseContext::new(SourceContext::from_source("test", "foo ~bar"), "tokenize");
        let err = ctx.report(
            ErrorKind::UnrecognizedInput {
                line: 1,
                column: 5,
                offset: 4,
            },
            to_source_span(4, 5),
        );
        let report = miette::Report::new(err);
        let output = format!("{report:?}");
        assert!(output.contains("unrecognized input"));
    }

    #[test]
    fn test_internal_error_attaches_help() {
        let ctx = PhaseContext::new(SourceContext::fallback("builder"), "build");
        let err = ctx.internal_error("Branch", "Atom", unspanned());
        assert!(err.diagnostic_info.help.is_some());
        assert_eq!(err.kind.category(), ErrorCategory::Structural);
    }
}
