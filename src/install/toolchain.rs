//! Go toolchain probing.
//!
//! Checks that `go` is reachable, queries its version, and resolves the
//! directory where `go install` will place binaries. Resolution order is
//! GOBIN, then GOPATH's bin subdirectory, then the conventional
//! `~/go/bin` fallback.

use std::path::PathBuf;
use std::process::Command;

use regex::Regex;

use crate::error::{InstallerError, Result};
use crate::shell;
use crate::steps::LogSink;

/// Verify that the Go toolchain is available and log its version.
///
/// Returns the version number (e.g. "1.22.5") when it can be extracted,
/// otherwise the trimmed `go version` output.
pub fn check_toolchain(sink: &mut LogSink) -> Result<String> {
    check_toolchain_at(shell::lookup_on_path("go"), sink)
}

fn check_toolchain_at(go: Option<PathBuf>, sink: &mut LogSink) -> Result<String> {
    let go = go.ok_or(InstallerError::ToolchainMissing)?;

    let mut cmd = Command::new(&go);
    cmd.arg("version");
    let outcome = shell::capture_merged(&mut cmd).map_err(|e| {
        InstallerError::ToolchainQueryFailed {
            message: e.to_string(),
        }
    })?;

    if !outcome.success {
        return Err(InstallerError::ToolchainQueryFailed {
            message: outcome.transcript.trim().to_string(),
        });
    }

    let reported = outcome.transcript.trim().to_string();
    sink.line(format!("Found {}", reported));
    Ok(extract_go_version(&reported).unwrap_or(reported))
}

/// Query one `go env` key, trimming the reported value.
pub fn go_env(key: &str) -> Result<String> {
    let mut cmd = Command::new("go");
    cmd.args(["env", key]);
    let outcome = shell::capture_merged(&mut cmd).map_err(|e| {
        InstallerError::ToolchainQueryFailed {
            message: format!("go env {} failed: {}", key, e),
        }
    })?;

    if !outcome.success {
        return Err(InstallerError::ToolchainQueryFailed {
            message: format!("go env {} failed: {}", key, outcome.transcript.trim()),
        });
    }

    Ok(outcome.transcript.trim().to_string())
}

/// Resolve the directory where `go install` places binaries.
///
/// Returns None when GOBIN and GOPATH are both unset and no home directory
/// can be found; callers surface that as
/// [`InstallerError::BinDirUnresolvable`].
pub fn resolve_bin_dir() -> Option<PathBuf> {
    resolve_bin_dir_with(|key| go_env(key).ok(), dirs::home_dir())
}

/// Resolution logic with injectable lookups, so tests can exercise the
/// fallback chain without a real toolchain or home directory.
fn resolve_bin_dir_with<F>(env: F, home: Option<PathBuf>) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(gobin) = env("GOBIN") {
        if !gobin.is_empty() {
            return Some(PathBuf::from(gobin));
        }
    }

    if let Some(gopath) = env("GOPATH") {
        if !gopath.is_empty() {
            return Some(PathBuf::from(gopath).join("bin"));
        }
    }

    home.map(|h| h.join("go").join("bin"))
}

/// Pull the bare version number out of `go version` output.
fn extract_go_version(reported: &str) -> Option<String> {
    let pattern = Regex::new(r"go(\d+\.\d+(?:\.\d+)?)").ok()?;
    pattern
        .captures(reported)
        .map(|caps| caps[1].to_string())
}
