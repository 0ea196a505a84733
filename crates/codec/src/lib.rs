//! Codec - A schema language compiler for entities, services and views.
//!
//! Parsing, resolution and code generation for the Codec schema language.
//! A schema is parsed into a raw syntax tree, resolved into a validated model
//! and handed to a generator selected by template name.

pub mod config;
pub mod generate;

mod error;

pub use codec_core::{annotation, model, naming, options, primitive, schema, statement};
pub use codec_parser::ast;

pub use error::CodecError;

use std::{fs, path::Path};

use log::{debug, info, trace};

use codec_parser::{ParseConfig, ast::CodecProject, error::ParseError};

use config::AppConfig;
use generate::GeneratorRegistry;
use model::ResolvedProject;

/// Compiles Codec schemas and generates code from them.
///
/// # Examples
///
/// ```rust,no_run
/// use codec::{Compiler, config::AppConfig};
///
/// let source = "entity Tag { val id: Int32 constraint primary_key(id) }";
///
/// let compiler = Compiler::new(AppConfig::default());
///
/// // Parse and resolve in one step
/// let project = compiler.compile(source).expect("Failed to compile");
///
/// // Write the generated files
/// compiler
///     .generate(&project, "postgres-ddl", "./generated")
///     .expect("Failed to generate");
/// ```
#[derive(Debug, Default)]
pub struct Compiler {
    config: AppConfig,
    registry: GeneratorRegistry,
}

impl Compiler {
    /// Create a new compiler with the given configuration.
    ///
    /// The built-in generators use the configured naming conventions.
    pub fn new(config: AppConfig) -> Self {
        let registry = GeneratorRegistry::with_naming(*config.naming());
        Self { config, registry }
    }

    /// Returns the configuration the compiler was created with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse source code into a raw project.
    ///
    /// With [`Recovery::SkipDeclaration`](options::Recovery::SkipDeclaration)
    /// configured, every broken declaration is reported rather than just the
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Parse`] carrying every syntax diagnostic.
    pub fn parse(&self, source: &str) -> Result<CodecProject, CodecError> {
        info!(recovery:? = self.config.parser().recovery(); "Parsing schema");

        let parse_config = ParseConfig::new(self.config.parser().recovery());
        let project = codec_parser::parse_with_config(source, &parse_config)
            .and_then(codec_parser::Parsed::into_result)
            .map_err(|err| CodecError::new_parse_error(err, source))?;

        debug!(declarations = project.declaration_count(); "Schema parsed successfully");
        Ok(project)
    }

    /// Resolve and validate a raw project.
    ///
    /// `source` is the text `project` was parsed from; diagnostics point into
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Parse`] carrying every resolution diagnostic.
    pub fn resolve(
        &self,
        project: &CodecProject,
        source: &str,
    ) -> Result<ResolvedProject, CodecError> {
        info!("Resolving schema");

        let resolved = codec_parser::resolve(project)
            .map_err(|err: ParseError| CodecError::new_parse_error(err, source))?;

        debug!(
            entities = resolved.entities().len(),
            services = resolved.services().len(),
            views = resolved.views().len();
            "Schema resolved successfully"
        );
        trace!(resolved:?; "Resolved project");
        Ok(resolved)
    }

    /// Parse and resolve source code.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Parse`] for syntax or resolution errors.
    pub fn compile(&self, source: &str) -> Result<ResolvedProject, CodecError> {
        let project = self.parse(source)?;
        self.resolve(&project, source)
    }

    /// Generate code for `project` with the generator registered as
    /// `template`, writing into `output_dir`.
    ///
    /// The output directory is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownTemplate`] if no generator is registered
    /// under `template`, [`CodecError::Io`] if the directory cannot be
    /// created, or [`CodecError::Generation`] if the generator fails.
    pub fn generate(
        &self,
        project: &ResolvedProject,
        template: &str,
        output_dir: impl AsRef<Path>,
    ) -> Result<(), CodecError> {
        let output_dir = output_dir.as_ref();
        let generator = self
            .registry
            .resolve(template)
            .ok_or_else(|| CodecError::UnknownTemplate {
                name: template.to_string(),
                available: self.registry.template_names().map(str::to_string).collect(),
            })?;

        info!(
            template = generator.display_name(),
            output_dir = output_dir.display().to_string();
            "Generating code"
        );

        fs::create_dir_all(output_dir)?;
        generator.generate(project, output_dir)?;

        info!("Generation completed");
        Ok(())
    }

    /// The generators available to [`Compiler::generate`].
    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    /// Mutable access to the registry, to register additional templates.
    pub fn registry_mut(&mut self) -> &mut GeneratorRegistry {
        &mut self.registry
    }
}
