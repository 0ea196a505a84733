//! Configuration types for the Codec compiler.
//!
//! This module provides configuration structures that control how schemas are
//! parsed and how generated code is named and written. All types implement
//! [`serde::Deserialize`] for loading from external sources, and every section
//! falls back to its defaults when omitted.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`ParserConfig`] - Failure policy of the parser ([`Recovery`]).
//! - [`NamingConfig`] - [`WordConvention`] applied to generated tables, columns and functions.
//! - [`GenerateConfig`] - Default template and output directory.
//!
//! # Example
//!
//! ```
//! # use codec::config::AppConfig;
//! # use codec_core::naming::WordConvention;
//! let config = AppConfig::default();
//! assert_eq!(config.naming().table(), WordConvention::SnakeCase);
//! assert_eq!(config.generate().template(), "postgres-ddl");
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use codec_core::{naming::WordConvention, options::Recovery};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Parser configuration section.
    #[serde(default)]
    parser: ParserConfig,

    /// Naming configuration section.
    #[serde(default)]
    naming: NamingConfig,

    /// Generation configuration section.
    #[serde(default)]
    generate: GenerateConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(parser: ParserConfig, naming: NamingConfig, generate: GenerateConfig) -> Self {
        Self {
            parser,
            naming,
            generate,
        }
    }

    /// Returns the parser configuration.
    pub fn parser(&self) -> &ParserConfig {
        &self.parser
    }

    /// Returns the naming configuration.
    pub fn naming(&self) -> &NamingConfig {
        &self.naming
    }

    /// Returns the generation configuration.
    pub fn generate(&self) -> &GenerateConfig {
        &self.generate
    }
}

/// How the parser reacts to syntax errors.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ParserConfig {
    #[serde(default)]
    recovery: Recovery,
}

impl ParserConfig {
    pub fn new(recovery: Recovery) -> Self {
        Self { recovery }
    }

    pub fn recovery(&self) -> Recovery {
        self.recovery
    }
}

/// Word conventions for identifiers in generated code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct NamingConfig {
    /// Convention for table names.
    #[serde(default)]
    table: WordConvention,

    /// Convention for column names.
    #[serde(default)]
    column: WordConvention,

    /// Convention for service function names.
    #[serde(default)]
    function: WordConvention,
}

impl NamingConfig {
    pub fn new(table: WordConvention, column: WordConvention, function: WordConvention) -> Self {
        Self {
            table,
            column,
            function,
        }
    }

    pub fn table(&self) -> WordConvention {
        self.table
    }

    pub fn column(&self) -> WordConvention {
        self.column
    }

    pub fn function(&self) -> WordConvention {
        self.function
    }
}

/// Defaults for code generation, overridable from the command line.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateConfig {
    /// Name of the generator template.
    #[serde(default = "GenerateConfig::default_template")]
    template: String,

    /// Directory generated files are written to.
    #[serde(default = "GenerateConfig::default_output")]
    output: PathBuf,
}

impl GenerateConfig {
    pub fn new(template: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            output: output.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    fn default_template() -> String {
        "postgres-ddl".to_string()
    }

    fn default_output() -> PathBuf {
        PathBuf::from("./generated")
    }
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            template: Self::default_template(),
            output: Self::default_output(),
        }
    }
}
