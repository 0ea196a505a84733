//! Code generation from resolved projects.
//!
//! This module provides the [`Generator`] trait implemented by every output
//! template and the [`GeneratorRegistry`] that maps template names to
//! generators. It is the final stage of the Codec pipeline.
//!
//! # Pipeline Position
//!
//! ```text
//! Source Text
//!     ↓ parse
//! Raw AST
//!     ↓ resolve
//! ResolvedProject
//!     ↓ generate (this module)
//! Output Files
//! ```
//!
//! # Available Templates
//!
//! - `postgres-ddl` - PostgreSQL schema script via [`postgres::PostgresDdl`]

pub mod postgres;

use std::{
    io,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

use codec_core::model::ResolvedProject;

use crate::config::NamingConfig;

/// An output template.
///
/// Generators receive only fully resolved projects: every reference they
/// follow is known to exist.
pub trait Generator: Send + Sync {
    /// Human-readable name used in logs.
    fn display_name(&self) -> &str;

    /// Writes the generated files for `project` into `output_dir`.
    ///
    /// The directory exists when this is called.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Io`] if writing fails, or
    /// [`GenerationError::Unsupported`] if the project uses something the
    /// template cannot express.
    fn generate(&self, project: &ResolvedProject, output_dir: &Path) -> Result<(), GenerationError>;
}

/// Errors raised by a [`Generator`].
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to write `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Unsupported(String),
}

/// Template name to generator lookup.
///
/// Names are matched case-insensitively and kept in registration order.
pub struct GeneratorRegistry {
    generators: IndexMap<String, Box<dyn Generator>>,
}

impl GeneratorRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            generators: IndexMap::new(),
        }
    }

    /// A registry with every built-in template, using `naming` for generated
    /// identifiers.
    pub fn with_naming(naming: NamingConfig) -> Self {
        let mut registry = Self::empty();
        registry.register("postgres-ddl", postgres::PostgresDdl::new(naming));
        registry
    }

    /// Registers `generator` under `name`, replacing any generator already
    /// registered under the same name.
    pub fn register(&mut self, name: &str, generator: impl Generator + 'static) {
        debug!(template = name; "Registering generator");
        self.generators
            .insert(name.to_ascii_lowercase(), Box::new(generator));
    }

    /// Looks up the generator registered under `template_name`.
    pub fn resolve(&self, template_name: &str) -> Option<&dyn Generator> {
        self.generators
            .get(&template_name.to_ascii_lowercase())
            .map(Box::as_ref)
    }

    /// Registered template names.
    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.generators.keys().map(String::as_str)
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::with_naming(NamingConfig::default())
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.generators.keys()).finish()
    }
}
