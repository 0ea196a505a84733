//! Word conventions for generated identifiers.
//!
//! Generators never emit schema names verbatim: table, column and function
//! names are converted to the [`WordConvention`] selected in configuration.

use std::fmt;

use convert_case::{Case, Casing};
use serde::Deserialize;

/// A naming convention applied to identifiers in generated code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordConvention {
    /// `person_address`
    #[default]
    SnakeCase,
    /// `personAddress`
    CamelCase,
    /// `PersonAddress`
    PascalCase,
}

impl WordConvention {
    /// Converts `name` to this convention.
    ///
    /// # Examples
    ///
    /// ```
    /// # use codec_core::naming::WordConvention;
    /// assert_eq!(WordConvention::SnakeCase.apply("PersonAddress"), "person_address");
    /// assert_eq!(WordConvention::CamelCase.apply("birth_date"), "birthDate");
    /// assert_eq!(WordConvention::PascalCase.apply("birth_date"), "BirthDate");
    /// ```
    pub fn apply(&self, name: &str) -> String {
        let case = match self {
            WordConvention::SnakeCase => Case::Snake,
            WordConvention::CamelCase => Case::Camel,
            WordConvention::PascalCase => Case::Pascal,
        };
        name.to_case(case)
    }
}

impl fmt::Display for WordConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordConvention::SnakeCase => f.write_str("snake_case"),
            WordConvention::CamelCase => f.write_str("camel_case"),
            WordConvention::PascalCase => f.write_str("pascal_case"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_from_pascal() {
        assert_eq!(WordConvention::SnakeCase.apply("Individual"), "individual");
        assert_eq!(
            WordConvention::SnakeCase.apply("LegalEntity"),
            "legal_entity"
        );
    }

    #[test]
    fn test_snake_case_is_idempotent() {
        assert_eq!(WordConvention::SnakeCase.apply("birth_date"), "birth_date");
    }

    #[test]
    fn test_camel_and_pascal() {
        assert_eq!(WordConvention::CamelCase.apply("created_at"), "createdAt");
        assert_eq!(WordConvention::PascalCase.apply("created_at"), "CreatedAt");
    }

    #[test]
    fn test_default_is_snake_case() {
        assert_eq!(WordConvention::default(), WordConvention::SnakeCase);
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// snake_case names whose words have at least two letters, so every word
    /// boundary survives a trip through PascalCase.
    fn snake_name_strategy() -> impl Strategy<Value = String> {
        proptest::collection::vec("[a-z]{2,8}", 1..4).prop_map(|words| words.join("_"))
    }

    fn convention_strategy() -> impl Strategy<Value = WordConvention> {
        prop_oneof![
            Just(WordConvention::SnakeCase),
            Just(WordConvention::CamelCase),
            Just(WordConvention::PascalCase),
        ]
    }

    // ===================
    // Property Test Functions
    // ===================

    fn check_snake_case_round_trip(
        name: &str,
        convention: WordConvention,
    ) -> Result<(), TestCaseError> {
        let converted = convention.apply(name);
        prop_assert_eq!(WordConvention::SnakeCase.apply(&converted), name);
        Ok(())
    }

    fn check_apply_is_idempotent(
        name: &str,
        convention: WordConvention,
    ) -> Result<(), TestCaseError> {
        let once = convention.apply(name);
        prop_assert_eq!(convention.apply(&once), once);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn snake_case_round_trip(name in snake_name_strategy(), convention in convention_strategy()) {
            check_snake_case_round_trip(&name, convention)?;
        }

        #[test]
        fn apply_is_idempotent(name in snake_name_strategy(), convention in convention_strategy()) {
            check_apply_is_idempotent(&name, convention)?;
        }
    }
}
