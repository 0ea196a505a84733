//! The ParseError type for wrapping diagnostics.
//!
//! [`ParseError`] wraps one or more [`Diagnostic`]s raised while parsing or
//! resolving a project.

use std::fmt;

use crate::error::{Diagnostic, ErrorCode};

/// Error type for parsing and resolution.
///
/// Wraps one or more diagnostics.
#[derive(Debug)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    /// Create a new parse error from diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get all diagnostics in this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the error and return its diagnostics.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Iterate over the diagnostics carrying `code`.
    pub fn with_code(&self, code: ErrorCode) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |diag| diag.code() == Some(code))
    }

    /// Returns `true` if any diagnostic carries `code`.
    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.with_code(code).next().is_some()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.diagnostics.first() {
            write!(f, "{}", first)?;
            if self.diagnostics.len() > 1 {
                write!(f, " (+{} more)", self.diagnostics.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_from_diagnostic() {
        let diag = Diagnostic::error("test error").with_code(ErrorCode::E300);
        let err: ParseError = diag.into();

        assert_eq!(err.diagnostics().len(), 1);
        assert_eq!(err.diagnostics()[0].message(), "test error");
    }

    #[test]
    fn test_parse_error_display_single() {
        let err: ParseError = Diagnostic::error("unknown type").into();

        assert_eq!(err.to_string(), "error: unknown type");
    }

    #[test]
    fn test_parse_error_display_multiple() {
        let diags = vec![
            Diagnostic::error("first error"),
            Diagnostic::error("second error"),
            Diagnostic::error("third error"),
        ];
        let err: ParseError = diags.into();

        assert_eq!(err.to_string(), "error: first error (+2 more)");
    }

    #[test]
    fn test_code_filters() {
        let err = ParseError::new(vec![
            Diagnostic::error("a").with_code(ErrorCode::E300),
            Diagnostic::error("b").with_code(ErrorCode::E309),
            Diagnostic::error("c").with_code(ErrorCode::E300),
        ]);

        assert_eq!(err.with_code(ErrorCode::E300).count(), 2);
        assert!(err.has_code(ErrorCode::E309));
        assert!(!err.has_code(ErrorCode::E301));
    }
}
