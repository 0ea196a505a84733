//! # Codec Parser
//!
//! Parser and semantic resolver for the Codec schema language. This crate
//! provides the pipeline from source text to a validated
//! [`ResolvedProject`]:
//!
//! 1. **Parse** - Build the raw [`ast::CodecProject`] from source text
//! 2. **Resolve** - Merge fields, check references and build the model
//!
//! ## Usage
//!
//! ```
//! # use codec_parser::{compile, ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         package Samples.People;
//!
//!         type Email = String { constraint max_len(254) }
//!
//!         trait Named { var name: String }
//!
//!         entity Person : Named {
//!             val id: Uuid
//!             var email: Email
//!             constraint primary_key(id)
//!         }
//!     "#;
//!
//!     let project = compile(source)?;
//!     assert_eq!(project.entities()[0].fields().len(), 3);
//!     Ok(())
//! }
//! ```

pub mod ast;
pub mod error;
mod lexical;
mod parser;
#[cfg(test)]
mod parser_tests;
mod resolve;
mod span;

pub use codec_core::options::Recovery;
pub use error::ParseError;
pub use span::{Location, Span, Spanned};

use log::debug;

use codec_core::model::ResolvedProject;

use ast::{
    AbstractEntityDefinition, CodecProject, ConfigDefinition, EntityDefinition, FieldDefinition,
    ServiceDefinition, TraitDefinition, TypeAlias, TypeRef, ViewDefinition,
};
use error::Diagnostic;

/// Options for [`parse_with_config`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseConfig {
    pub recovery: Recovery,
}

impl ParseConfig {
    pub fn new(recovery: Recovery) -> Self {
        Self { recovery }
    }
}

/// The outcome of a recovering parse: every declaration that parsed, and the
/// syntax diagnostics of the ones that did not.
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    pub project: CodecProject,
    pub diagnostics: Vec<Diagnostic>,
}

impl Parsed {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// The project if nothing failed, otherwise every diagnostic.
    pub fn into_result(self) -> Result<CodecProject, ParseError> {
        if self.diagnostics.is_empty() {
            Ok(self.project)
        } else {
            Err(ParseError::new(self.diagnostics))
        }
    }
}

/// Parse source text into a raw project, failing on the first syntax error.
///
/// # Example
///
/// ```
/// # use codec_parser::parse;
/// let project = parse("type Email = String").unwrap();
/// assert_eq!(project.type_aliases.len(), 1);
///
/// assert!(parse("entity person {}").is_err());
/// ```
pub fn parse(source: &str) -> Result<CodecProject, ParseError> {
    parse_with_config(source, &ParseConfig::default()).and_then(Parsed::into_result)
}

/// Parse source text with an explicit failure policy.
///
/// With [`Recovery::Abort`] the first syntax error is returned as an error.
/// With [`Recovery::SkipDeclaration`] this always succeeds; broken
/// declarations are skipped and reported in [`Parsed::diagnostics`].
pub fn parse_with_config(source: &str, config: &ParseConfig) -> Result<Parsed, ParseError> {
    let (project, diagnostics) = parser::parse_project(source, config.recovery);
    debug!(
        declarations = project.declaration_count(),
        errors = diagnostics.len();
        "Parsed project"
    );

    match config.recovery {
        Recovery::Abort if !diagnostics.is_empty() => Err(ParseError::new(diagnostics)),
        _ => Ok(Parsed {
            project,
            diagnostics,
        }),
    }
}

/// Resolve and validate a raw project.
///
/// Every check runs; on failure the error carries every diagnostic found.
pub fn resolve(project: &CodecProject) -> Result<ResolvedProject, ParseError> {
    resolve::resolve(project)
}

/// Parse and resolve in one step.
pub fn compile(source: &str) -> Result<ResolvedProject, ParseError> {
    let project = parse(source)?;
    resolve(&project)
}

/// Parse a single `type` declaration.
pub fn parse_type_alias(source: &str) -> Result<TypeAlias, ParseError> {
    parser::parse_fragment(source, "type alias", parser::type_alias).map_err(ParseError::from)
}

/// Parse a single `trait` declaration.
pub fn parse_trait(source: &str) -> Result<TraitDefinition, ParseError> {
    parser::parse_fragment(source, "trait", parser::trait_definition).map_err(ParseError::from)
}

/// Parse a single `abstract entity` declaration.
pub fn parse_abstract_entity(source: &str) -> Result<AbstractEntityDefinition, ParseError> {
    parser::parse_fragment(source, "abstract entity", parser::abstract_entity)
        .map_err(ParseError::from)
}

/// Parse a single `entity` declaration.
pub fn parse_entity(source: &str) -> Result<EntityDefinition, ParseError> {
    parser::parse_fragment(source, "entity", parser::entity).map_err(ParseError::from)
}

/// Parse a single `service` declaration.
pub fn parse_service(source: &str) -> Result<ServiceDefinition, ParseError> {
    parser::parse_fragment(source, "service", parser::service).map_err(ParseError::from)
}

/// Parse a single `view` declaration.
pub fn parse_view(source: &str) -> Result<ViewDefinition, ParseError> {
    parser::parse_fragment(source, "view", parser::view).map_err(ParseError::from)
}

/// Parse a single `config` block.
pub fn parse_config(source: &str) -> Result<ConfigDefinition, ParseError> {
    parser::parse_fragment(source, "config", parser::config).map_err(ParseError::from)
}

/// Parse a single `var` or `val` field.
pub fn parse_field(source: &str) -> Result<FieldDefinition, ParseError> {
    parser::parse_fragment(source, "field", parser::field).map_err(ParseError::from)
}

/// Parse a type reference: a primitive keyword or a PascalCase name.
///
/// ```
/// # use codec_parser::{ast::TypeRef, parse_type_ref};
/// # use codec_core::primitive::PrimitiveType;
/// assert_eq!(parse_type_ref("Int64").unwrap(), TypeRef::Primitive(PrimitiveType::Int64));
/// assert_eq!(parse_type_ref("StringList").unwrap(), TypeRef::Named("StringList".into()));
/// ```
pub fn parse_type_ref(source: &str) -> Result<TypeRef, ParseError> {
    parser::parse_fragment(source, "type reference", parser::type_ref)
        .map(Spanned::into_inner)
        .map_err(ParseError::from)
}
