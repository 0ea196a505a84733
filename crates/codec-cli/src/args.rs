//! Command-line argument definitions for the Codec CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control the input schema, the generator template
//! and output directory, configuration file selection, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Codec schema compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input Codec schema
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Generator template (defaults to the configured template)
    #[arg(short, long)]
    pub template: Option<String>,

    /// Output directory (defaults to the configured directory)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Only parse and validate the schema, without generating code
    #[arg(long)]
    pub check: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
