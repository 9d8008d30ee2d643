//! CLI argument definitions.
//!
//! All flags are defined with clap's derive macros on the [`Cli`] struct.
//! The built-in `-V`/`--version` flag prints the installer version and
//! exits without touching the pipeline.

use clap::Parser;

use crate::install::DEFAULT_MODULE;

/// Interactive installer for the cairn CLI.
#[derive(Debug, Parser)]
#[command(name = "cairn-installer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// cairn version to install (e.g. v0.3.1 or latest)
    #[arg(long, value_name = "REF", default_value = "latest")]
    pub cairn_version: String,

    /// Go module path for the cairn CLI
    #[arg(long, value_name = "MODULE", default_value = DEFAULT_MODULE)]
    pub module: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Show every line of command output while steps run
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}
