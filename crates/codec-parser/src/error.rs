//! Error and diagnostic system for the Codec parser and resolver.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error message with optional error code, multiple source
//! locations, the names it concerns, and help text. Multiple diagnostics are
//! wrapped in [`ParseError`] for returning from parsing and resolution.
//!
//! # Example
//!
//! ```
//! # use codec_parser::error::{Diagnostic, ErrorCode};
//! # use codec_parser::Span;
//!
//! let span = Span::new(100..120);
//! let original_span = Span::new(50..70);
//!
//! let diag = Diagnostic::error("entity `Person` is defined multiple times")
//!     .with_code(ErrorCode::E301)
//!     .with_subject("Person")
//!     .with_label(span, "duplicate definition")
//!     .with_secondary_label(original_span, "first defined here")
//!     .with_help("remove the duplicate or use a different name");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
