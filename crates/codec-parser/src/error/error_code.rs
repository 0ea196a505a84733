//! Error codes for the Codec diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexical errors
//! - `E1xx` - Syntax errors
//! - `E3xx` - Resolution errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexical Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but never closed on the same line.
    E001,

    /// Invalid escape sequence.
    ///
    /// Valid escapes are: `\"`, `\\`, `\n`, `\t`, `\r`.
    E002,

    // =========================================================================
    // Syntax Errors (E1xx)
    // =========================================================================
    /// Unexpected input.
    ///
    /// The parser encountered input it did not expect at this position.
    E100,

    /// Incomplete input.
    ///
    /// The input ended before a complete construct was parsed.
    E101,

    // =========================================================================
    // Resolution Errors (E3xx)
    // =========================================================================
    /// Unknown type.
    ///
    /// A referenced name matches neither a primitive nor a declaration of the
    /// kind expected at that position.
    E300,

    /// Duplicate name.
    ///
    /// A name was declared twice in the same namespace.
    E301,

    /// Cyclic type alias.
    ///
    /// A chain of type aliases refers back to itself.
    E302,

    /// Cyclic trait extension.
    ///
    /// A trait extends itself, directly or through other traits.
    E303,

    /// Field conflict.
    ///
    /// Two sources of a merged field set declare the same field with a
    /// different type or mutability.
    E304,

    /// Unknown base type.
    ///
    /// An entity's supertype is neither an abstract entity nor a trait.
    E305,

    /// Multiple base types.
    ///
    /// An entity names more than one abstract entity as supertype.
    E306,

    /// Unknown entity.
    ///
    /// A relationship target or query source names no declared entity.
    E307,

    /// Relationship mismatch.
    ///
    /// The two sides of a bidirectional relationship do not agree.
    E308,

    /// Unknown column.
    ///
    /// A constraint names a column that is not a field of the entity.
    E309,

    /// Missing discriminator.
    ///
    /// A single-table inheritance strategy declares no discriminator column.
    E310,

    /// Unresolved query field.
    ///
    /// A `select` or `where` clause names a field none of the query's
    /// sources provide.
    E311,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexical errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            // Syntax errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            // Resolution errors
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
            ErrorCode::E306 => "E306",
            ErrorCode::E307 => "E307",
            ErrorCode::E308 => "E308",
            ErrorCode::E309 => "E309",
            ErrorCode::E310 => "E310",
            ErrorCode::E311 => "E311",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexical errors
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "invalid escape sequence",
            // Syntax errors
            ErrorCode::E100 => "unexpected input",
            ErrorCode::E101 => "incomplete input",
            // Resolution errors
            ErrorCode::E300 => "unknown type",
            ErrorCode::E301 => "duplicate name",
            ErrorCode::E302 => "cyclic type alias",
            ErrorCode::E303 => "cyclic trait extension",
            ErrorCode::E304 => "field conflict",
            ErrorCode::E305 => "unknown base type",
            ErrorCode::E306 => "multiple base types",
            ErrorCode::E307 => "unknown entity",
            ErrorCode::E308 => "relationship mismatch",
            ErrorCode::E309 => "unknown column",
            ErrorCode::E310 => "missing discriminator",
            ErrorCode::E311 => "unresolved query field",
        }
    }

    /// Returns `true` for codes raised while parsing rather than resolving.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            ErrorCode::E001 | ErrorCode::E002 | ErrorCode::E100 | ErrorCode::E101
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
