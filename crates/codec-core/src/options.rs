//! Caller-selectable compiler policies.

use serde::Deserialize;

/// What the project parser does when a top-level declaration fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recovery {
    /// The first syntax error fails the whole parse.
    #[default]
    Abort,
    /// The broken declaration is reported and skipped; parsing resumes at the
    /// next line that starts a top-level declaration.
    SkipDeclaration,
}
