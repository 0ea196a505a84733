//! The core diagnostic type for the Codec error system.

use std::fmt;

use crate::{
    error::{error_code::ErrorCode, label::Label},
    span::Span,
};

/// A rich diagnostic message with source location information.
///
/// Diagnostics carry:
/// - An optional error code for documentation and searchability
/// - A primary message describing the issue
/// - The names of the declarations, fields or columns at fault
/// - One or more labeled source spans
/// - Optional help text with suggestions
///
/// # Example
///
/// ```text
/// error[E300]: unknown type `Emial`
///   --> person.codec:4:15
///    |
///  4 |     var email: Emial
///    |                ^^^^^ not a primitive or a declared type alias
///    |
///    = help: declare it with `type Emial = String`
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    code: Option<ErrorCode>,
    message: String,
    subjects: Vec<String>,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use codec_parser::error::{Diagnostic, ErrorCode};
    /// # use codec_parser::Span;
    ///
    /// let span = Span::new(0..10);
    /// let diag = Diagnostic::error("unknown type `Emial`")
    ///     .with_code(ErrorCode::E300)
    ///     .with_label(span, "not found")
    ///     .with_help("did you mean `Email`?");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            subjects: Vec::new(),
            labels: Vec::new(),
            help: None,
        }
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Names of the offending declarations, fields or columns.
    ///
    /// A cycle diagnostic lists every member of the cycle.
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Get the span of the first primary label, if any.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::span)
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Record a name this diagnostic is about.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subjects.push(subject.into());
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E001]: message" or "error: message"
        f.write_str("error")?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_new() {
        let diag = Diagnostic::error("test error");

        assert_eq!(diag.message(), "test error");
        assert!(diag.code().is_none());
        assert!(diag.subjects().is_empty());
        assert!(diag.labels().is_empty());
        assert!(diag.help().is_none());
    }

    #[test]
    fn test_diagnostic_with_subjects() {
        let diag = Diagnostic::error("cyclic type alias")
            .with_code(ErrorCode::E302)
            .with_subject("A")
            .with_subject("B");

        assert_eq!(diag.subjects(), ["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_diagnostic_primary_span() {
        let diag = Diagnostic::error("duplicate definition")
            .with_secondary_label(Span::new(5..15), "first defined here")
            .with_label(Span::new(10..20), "duplicate here");

        assert_eq!(diag.primary_span(), Some(Span::new(10..20)));
        assert_eq!(diag.labels().len(), 2);
        assert!(diag.labels()[0].is_secondary());
    }

    #[test]
    fn test_diagnostic_display_with_code() {
        let diag = Diagnostic::error("unknown type `Foo`").with_code(ErrorCode::E300);

        assert_eq!(diag.to_string(), "error[E300]: unknown type `Foo`");
    }

    #[test]
    fn test_diagnostic_display_without_code() {
        let diag = Diagnostic::error("unexpected end of input");

        assert_eq!(diag.to_string(), "error: unexpected end of input");
    }

    #[test]
    fn test_diagnostic_builder_chain() {
        let diag = Diagnostic::error("entity `Person` is defined multiple times")
            .with_code(ErrorCode::E301)
            .with_label(Span::new(100..120), "duplicate definition")
            .with_secondary_label(Span::new(50..70), "first defined here")
            .with_help("remove the duplicate or use a different name");

        assert_eq!(diag.code(), Some(ErrorCode::E301));
        assert_eq!(diag.labels().len(), 2);
        assert_eq!(
            diag.help(),
            Some("remove the duplicate or use a different name")
        );
    }
}
