//! `go install` execution.
//!
//! Runs the toolchain's install subcommand for a `module@version` reference
//! and streams its combined output to the step's sink line by line, so the
//! user sees module downloads as they happen.

use std::path::Path;
use std::process::Command;

use crate::error::{InstallerError, Result};
use crate::shell;
use crate::steps::LogSink;

/// Run `go install <module>@<version>`, streaming output to the sink.
pub fn install(module: &str, version: &str, sink: &mut LogSink) -> Result<()> {
    install_with(Path::new("go"), module, version, sink)
}

fn install_with(program: &Path, module: &str, version: &str, sink: &mut LogSink) -> Result<()> {
    let target = format!("{}@{}", module, version);
    sink.line(format!("Installing {} ...", target));

    let mut cmd = Command::new(program);
    cmd.args(["install", &target]);

    let outcome = shell::stream_lines(&mut cmd, |line| sink.line(line))?;

    if !outcome.success {
        return Err(InstallerError::InstallCommandFailed {
            module: module.to_string(),
            version: version.to_string(),
            code: outcome.exit_code,
            output: outcome.transcript,
        });
    }

    Ok(())
}
