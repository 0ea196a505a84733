//! Error types for Codec operations.
//!
//! This module provides the main error type [`CodecError`] which wraps the
//! error conditions that can occur while compiling a schema and generating
//! code from it.

use std::io;

use thiserror::Error;

use codec_parser::error::ParseError;

use crate::generate::GenerationError;

/// The main error type for Codec operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries every diagnostic raised by parsing or
/// resolution together with the source they point into, so callers can render
/// them with source snippets.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Unknown template `{name}` (available: {})", available.join(", "))]
    UnknownTemplate {
        name: String,
        available: Vec<String>,
    },

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}

impl CodecError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_template_lists_available() {
        let err = CodecError::UnknownTemplate {
            name: "csharp".to_string(),
            available: vec!["postgres-ddl".to_string()],
        };

        assert_eq!(
            err.to_string(),
            "Unknown template `csharp` (available: postgres-ddl)"
        );
    }
}
