//! PATH persistence through the per-user environment store.
//!
//! The persisted `Path` value lives under `HKCU\Environment`. It is read
//! with `reg query`, rewritten wholesale, and written back preferably via
//! PowerShell's `[Environment]::SetEnvironmentVariable`, which broadcasts
//! the environment change so newly spawned processes observe it without a
//! logoff. When PowerShell is unavailable the write falls back to
//! `reg add`, which persists but does not broadcast.
//!
//! A store that cannot be read or written is downgraded to a session-only
//! warning when the live PATH already satisfies the requirement, since the
//! verification step that follows can still succeed.

use std::path::Path;
use std::process::Command;

use crate::error::{InstallerError, Result};
use crate::shell;
use crate::steps::LogSink;

use super::{live_path_contains, PathMutationDecision, PathPersistence, PersistOutcome};

/// Per-user environment store backend.
pub struct WindowsPathBackend;

/// Which mechanism performed the store write.
enum WriteRoute {
    /// PowerShell wrote the value and broadcast the change.
    Broadcast,
    /// `reg add` wrote the value; a new terminal is needed to observe it.
    RegistryOnly,
}

impl WindowsPathBackend {
    pub fn new() -> Self {
        Self
    }

    /// Fall back to a session-only success when the store is unusable but
    /// the live PATH already carries the directory.
    fn soft_success(
        &self,
        dir: &Path,
        err: InstallerError,
        sink: &mut LogSink,
    ) -> Result<PersistOutcome> {
        if live_path_contains(dir) {
            sink.line(format!(
                "Warning: {}; continuing because {} is already on the session PATH, but the change may not survive a new terminal",
                err,
                dir.display()
            ));
            return Ok(PersistOutcome::SessionOnly);
        }
        Err(err)
    }
}

impl Default for WindowsPathBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PathPersistence for WindowsPathBackend {
    fn is_persisted(&self, dir: &Path) -> Result<bool> {
        let current = read_user_path()?;
        Ok(super::list_contains(&current, dir, true))
    }

    fn persist(&self, dir: &Path, sink: &mut LogSink) -> Result<PersistOutcome> {
        let current = read_user_path()?;
        let decision = PathMutationDecision::compute(&current, dir, true);

        let Some(updated) = decision.updated_value else {
            sink.line(format!("User Path already contains {}", dir.display()));
            return Ok(PersistOutcome::Unchanged);
        };

        match write_user_path(&updated)? {
            WriteRoute::Broadcast => sink.line(format!(
                "Added {} to the user Path (change broadcast to new processes)",
                dir.display()
            )),
            WriteRoute::RegistryOnly => sink.line(format!(
                "Added {} to the user Path via the registry (open a new terminal)",
                dir.display()
            )),
        }

        Ok(PersistOutcome::Updated)
    }

    fn ensure(&self, dir: &Path, sink: &mut LogSink) -> Result<PersistOutcome> {
        if live_path_contains(dir) {
            sink.line(format!(
                "{} is already on the current session Path",
                dir.display()
            ));
        }

        match self.is_persisted(dir) {
            Ok(true) => {
                sink.line(format!("User Path already contains {}", dir.display()));
                Ok(PersistOutcome::Unchanged)
            }
            Ok(false) => match self.persist(dir, sink) {
                Ok(outcome) => Ok(outcome),
                Err(err) => self.soft_success(dir, err, sink),
            },
            Err(err) => self.soft_success(dir, err, sink),
        }
    }
}

/// Read the persisted per-user Path value. A missing value is an empty
/// list, not an error: fresh profiles have no user Path at all.
fn read_user_path() -> Result<String> {
    let mut cmd = Command::new("reg");
    cmd.args(["query", r"HKCU\Environment", "/v", "Path"]);

    match shell::capture_merged(&mut cmd) {
        Ok(outcome) if outcome.success => Ok(parse_reg_value(&outcome.transcript)),
        Ok(outcome) => {
            if outcome.transcript.contains("ERROR:") {
                Ok(String::new())
            } else {
                Err(InstallerError::RegistryReadFailure {
                    message: outcome.transcript.trim().to_string(),
                })
            }
        }
        Err(e) => Err(InstallerError::RegistryReadFailure {
            message: e.to_string(),
        }),
    }
}

/// Write the whole user Path value back to the store.
fn write_user_path(value: &str) -> Result<WriteRoute> {
    if let Some(powershell) = powershell_exe() {
        let script = format!(
            "[Environment]::SetEnvironmentVariable('Path', '{}', 'User')",
            value.replace('\'', "''")
        );
        let mut cmd = Command::new(powershell);
        cmd.args(["-NoProfile", "-ExecutionPolicy", "Bypass", "-Command", &script]);
        if let Ok(outcome) = shell::capture_merged(&mut cmd) {
            if outcome.success {
                return Ok(WriteRoute::Broadcast);
            }
        }
    }

    let mut cmd = Command::new("reg");
    cmd.args([
        "add",
        r"HKCU\Environment",
        "/v",
        "Path",
        "/t",
        "REG_EXPAND_SZ",
        "/d",
        value,
        "/f",
    ]);

    match shell::capture_merged(&mut cmd) {
        Ok(outcome) if outcome.success => Ok(WriteRoute::RegistryOnly),
        Ok(outcome) => Err(InstallerError::RegistryWriteFailure {
            message: outcome.transcript.trim().to_string(),
        }),
        Err(e) => Err(InstallerError::RegistryWriteFailure {
            message: e.to_string(),
        }),
    }
}

fn powershell_exe() -> Option<std::path::PathBuf> {
    shell::lookup_on_path("powershell").or_else(|| shell::lookup_on_path("pwsh"))
}

/// Pull the data column out of `reg query` output. The value line looks
/// like `    Path    REG_EXPAND_SZ    C:\one;C:\two`.
fn parse_reg_value(transcript: &str) -> String {
    for line in transcript.lines() {
        if line.contains("REG_") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 3 {
                return parts[2..].join(" ");
            }
        }
    }
    String::new()
}
