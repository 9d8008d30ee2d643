//! Child process execution with line streaming.
//!
//! Subprocess output is treated as opaque text: stdout and stderr are read
//! line by line on dedicated threads, funneled through a channel in arrival
//! order, and handed to a caller-supplied closure while the combined
//! transcript is captured for error reporting.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

/// Result of running a child process to completion.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Whether the process exited with code 0.
    pub success: bool,

    /// Combined stdout and stderr, one line per entry, in arrival order.
    pub transcript: String,
}

/// Run a command, invoking `on_line` for each output line as it arrives.
///
/// Both output streams are piped and merged. The returned transcript holds
/// every line that was forwarded, so callers can attach it to an error
/// without re-running the command.
pub fn stream_lines<F>(cmd: &mut Command, mut on_line: F) -> std::io::Result<CommandOutcome>
where
    F: FnMut(&str),
{
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn()?;

    let stdout = child.stdout.take().unwrap();
    let stderr = child.stderr.take().unwrap();

    let (tx, rx) = mpsc::channel::<String>();
    let tx_stderr = tx.clone();

    let stdout_handle = thread::spawn(move || {
        let reader = BufReader::new(stdout);
        for line in reader.lines().map_while(std::result::Result::ok) {
            let _ = tx.send(line);
        }
    });

    let stderr_handle = thread::spawn(move || {
        let reader = BufReader::new(stderr);
        for line in reader.lines().map_while(std::result::Result::ok) {
            let _ = tx_stderr.send(line);
        }
    });

    let mut transcript = String::new();
    for line in rx {
        on_line(&line);
        transcript.push_str(&line);
        transcript.push('\n');
    }

    let _ = stdout_handle.join();
    let _ = stderr_handle.join();

    let status = child.wait()?;

    Ok(CommandOutcome {
        exit_code: status.code(),
        success: status.success(),
        transcript,
    })
}

/// Run a command and capture its merged output without streaming it anywhere.
pub fn capture_merged(cmd: &mut Command) -> std::io::Result<CommandOutcome> {
    stream_lines(cmd, |_| {})
}

/// Locate an executable by searching the live PATH.
///
/// On Windows the common executable extensions are tried as well, since
/// `go` ships as `go.exe`.
pub fn lookup_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;

    for dir in std::env::split_paths(&path) {
        if dir.as_os_str().is_empty() {
            continue;
        }

        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }

        if cfg!(windows) {
            for ext in ["exe", "cmd", "bat"] {
                let candidate = dir.join(format!("{}.{}", name, ext));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
    }

    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.is_file()
        && std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
