//! Validation annotations attached to fields and type aliases.

use std::fmt;

/// A validation constraint carried from a schema into generated code.
///
/// Annotations are written inside a constraint block:
///
/// ```text
/// type Email = String {
///     constraint max_len(254)
///     constraint regex("^[^@]+@[^@]+$")
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Annotation {
    /// Lower bound: minimum length for textual types, minimum value otherwise.
    Min(i64),
    /// Upper bound: maximum length for textual types, maximum value otherwise.
    Max(i64),
    /// The value must match this regular expression.
    Regex(String),
    /// The value must be unique across all stored records.
    Unique,
}

impl Annotation {
    /// Returns `true` if both annotations constrain the same property.
    ///
    /// Two `Min` annotations are of the same kind regardless of their bound.
    pub fn same_kind(&self, other: &Annotation) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Min(value) => write!(f, "min({value})"),
            Annotation::Max(value) => write!(f, "max({value})"),
            Annotation::Regex(pattern) => write!(f, "regex({pattern:?})"),
            Annotation::Unique => write!(f, "unique"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Annotation::Min(3).to_string(), "min(3)");
        assert_eq!(Annotation::Max(-1).to_string(), "max(-1)");
        assert_eq!(
            Annotation::Regex("^a+$".to_string()).to_string(),
            "regex(\"^a+$\")"
        );
        assert_eq!(Annotation::Unique.to_string(), "unique");
    }

    #[test]
    fn test_same_kind() {
        assert!(Annotation::Min(1).same_kind(&Annotation::Min(20)));
        assert!(!Annotation::Min(1).same_kind(&Annotation::Max(1)));
        assert!(Annotation::Unique.same_kind(&Annotation::Unique));
    }
}
