//! CLI logic for the Codec schema compiler.
//!
//! This module contains the core CLI logic: it loads configuration, compiles
//! the input schema and hands it to the selected generator.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, path::Path};

use log::info;

use codec::{CodecError, Compiler};

/// Run the Codec CLI application
///
/// This function compiles the input schema and, unless `--check` is given,
/// generates code into the output directory.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `CodecError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Syntax and resolution errors
/// - Unknown templates
/// - Generation errors
pub fn run(args: &Args) -> Result<(), CodecError> {
    info!(input_path = args.input, check = args.check; "Processing schema");

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;

    let compiler = Compiler::new(app_config);
    let project = compiler.compile(&source)?;

    if args.check {
        info!(
            entities = project.entities().len(),
            services = project.services().len(),
            views = project.views().len();
            "Schema is valid"
        );
        return Ok(());
    }

    let generate = compiler.config().generate();
    let template = args.template.as_deref().unwrap_or(generate.template());
    let output = args
        .output
        .as_deref()
        .map_or(generate.output(), Path::new);

    compiler.generate(&project, template, output)?;

    info!(template = template, output_dir = output.display().to_string(); "Code generated successfully");

    Ok(())
}
