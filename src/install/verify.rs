//! Post-install verification.
//!
//! Confirms the freshly installed binary is actually runnable. The PATH
//! lookup is tried first; a shell that has not been restarted usually will
//! not see the new entry yet, so the expected bin directory is probed
//! directly as a fallback.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{InstallerError, Result};
use crate::shell;
use crate::steps::LogSink;

use super::{toolchain, TOOL_NAME};

/// Check that the installed binary runs, from PATH or its install location.
pub fn verify(sink: &mut LogSink) -> Result<()> {
    verify_with(TOOL_NAME, toolchain::resolve_bin_dir(), sink)
}

fn verify_with(tool: &str, bin_dir: Option<PathBuf>, sink: &mut LogSink) -> Result<()> {
    sink.line(format!("Verifying '{}' on PATH ...", tool));

    match run_version(Path::new(tool)) {
        Ok(reported) => {
            for line in reported.lines() {
                sink.line(line);
            }
            return Ok(());
        }
        Err(reason) => {
            sink.line(format!("Not runnable from PATH yet ({})", reason));
        }
    }

    let bin_dir = bin_dir.ok_or(InstallerError::BinDirUnresolvable)?;
    let candidate = bin_dir.join(exe_name(tool));

    if !candidate.exists() {
        return Err(InstallerError::BinaryNotFound {
            binary: tool.to_string(),
            candidate,
        });
    }

    match run_version(&candidate) {
        Ok(reported) => {
            for line in reported.lines() {
                sink.line(line);
            }
            sink.line(format!("Found at {}", candidate.display()));
            Ok(())
        }
        Err(message) => Err(InstallerError::BinaryExecutionFailed { candidate, message }),
    }
}

/// Run `<program> version` and return its trimmed combined output.
fn run_version(program: &Path) -> std::result::Result<String, String> {
    let mut cmd = Command::new(program);
    cmd.arg("version");

    match shell::capture_merged(&mut cmd) {
        Ok(outcome) if outcome.success => Ok(outcome.transcript.trim().to_string()),
        Ok(outcome) => Err(format!(
            "exit code {:?}: {}",
            outcome.exit_code,
            outcome.transcript.trim()
        )),
        Err(e) => Err(e.to_string()),
    }
}

/// Platform-correct executable file name.
fn exe_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::PipelineEvent;
    use std::sync::mpsc::{self, Receiver};

    // A name that is never on PATH, forcing the direct-path fallback.
    const OFF_PATH_TOOL: &str = "cairn-verify-test-binary";

    fn test_sink() -> (LogSink, Receiver<PipelineEvent>) {
        let (tx, rx) = mpsc::channel();
        (LogSink::new(0, tx), rx)
    }

    fn sink_lines(rx: &Receiver<PipelineEvent>) -> Vec<String> {
        rx.try_iter()
            .filter_map(|event| match event {
                PipelineEvent::Line { line, .. } => Some(line),
                PipelineEvent::Done { .. } => None,
            })
            .collect()
    }

    #[cfg(unix)]
    fn write_tool(dir: &Path, script_body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(OFF_PATH_TOOL);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script_body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn exe_name_matches_platform() {
        if cfg!(windows) {
            assert_eq!(exe_name("cairn"), "cairn.exe");
        } else {
            assert_eq!(exe_name("cairn"), "cairn");
        }
    }

    #[test]
    fn missing_everywhere_is_binary_not_found() {
        let temp = tempfile::TempDir::new().unwrap();
        let (mut sink, _rx) = test_sink();

        let err = verify_with(OFF_PATH_TOOL, Some(temp.path().to_path_buf()), &mut sink)
            .unwrap_err();

        match err {
            InstallerError::BinaryNotFound { binary, candidate } => {
                assert_eq!(binary, OFF_PATH_TOOL);
                assert!(candidate.starts_with(temp.path()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn unresolvable_bin_dir_is_surfaced() {
        let (mut sink, _rx) = test_sink();
        let err = verify_with(OFF_PATH_TOOL, None, &mut sink).unwrap_err();
        assert!(matches!(err, InstallerError::BinDirUnresolvable));
    }

    #[test]
    #[cfg(unix)]
    fn direct_path_fallback_succeeds_and_logs_both_attempts() {
        let temp = tempfile::TempDir::new().unwrap();
        write_tool(temp.path(), "echo 'cairn version 0.3.1'");
        let (mut sink, rx) = test_sink();

        verify_with(OFF_PATH_TOOL, Some(temp.path().to_path_buf()), &mut sink).unwrap();

        let lines = sink_lines(&rx);
        assert!(lines.iter().any(|l| l.contains("Not runnable from PATH yet")));
        assert!(lines.iter().any(|l| l.contains("cairn version 0.3.1")));
        assert!(lines.iter().any(|l| l.contains("Found at")));
    }

    #[test]
    #[cfg(unix)]
    fn present_but_broken_binary_is_execution_failure() {
        let temp = tempfile::TempDir::new().unwrap();
        write_tool(temp.path(), "echo 'segfault' >&2\nexit 2");
        let (mut sink, _rx) = test_sink();

        let err = verify_with(OFF_PATH_TOOL, Some(temp.path().to_path_buf()), &mut sink)
            .unwrap_err();

        match err {
            InstallerError::BinaryExecutionFailed { message, .. } => {
                assert!(message.contains("segfault"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
