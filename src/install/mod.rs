//! Installation pipeline assembly.
//!
//! Binds the toolchain prober, PATH persistence backend, install executor,
//! and verifier into the fixed five-step pipeline a run executes.
//!
//! # Modules
//!
//! - [`executor`] - `go install` execution with live output streaming
//! - [`toolchain`] - Toolchain probing and bin directory resolution
//! - [`verify`] - Post-install binary verification

pub mod executor;
pub mod toolchain;
pub mod verify;

use std::fs;

use crate::error::{InstallerError, Result};
use crate::pathenv::{self, PathPersistence};
use crate::steps::{LogSink, Step};

/// Go module installed by default.
pub const DEFAULT_MODULE: &str = "github.com/cairn-dev/cairn/cmd/cairn";

/// Name of the executable the module builds.
pub const TOOL_NAME: &str = "cairn";

/// Build the installation pipeline for a module and version reference.
///
/// Steps run in this order and the run halts at the first failure.
pub fn installation_steps(module: String, version: String) -> Vec<Step> {
    vec![
        Step::new("Check Go toolchain", |sink: &mut LogSink| {
            toolchain::check_toolchain(sink).map(|_| ())
        }),
        Step::new("Prepare bin directory", prepare_bin_dir),
        Step::new("Ensure PATH contains bin", |sink: &mut LogSink| {
            let bin = toolchain::resolve_bin_dir().ok_or(InstallerError::BinDirUnresolvable)?;
            let backend = pathenv::platform_backend()?;
            backend.ensure(&bin, sink).map(|_| ())
        }),
        Step::new("Install cairn", move |sink: &mut LogSink| {
            executor::install(&module, &version, sink)
        }),
        Step::new("Verify cairn runs", verify::verify),
    ]
}

fn prepare_bin_dir(sink: &mut LogSink) -> Result<()> {
    let bin = toolchain::resolve_bin_dir().ok_or(InstallerError::BinDirUnresolvable)?;
    sink.line(format!("Using bin directory: {}", bin.display()));
    fs::create_dir_all(&bin).map_err(|source| InstallerError::FileIOFailure {
        path: bin.clone(),
        source,
    })?;
    Ok(())
}
