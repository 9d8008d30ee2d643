//! PATH persistence through shell startup files.
//!
//! The user's shell (from `$SHELL`) selects an ordered list of candidate
//! startup files. If none of them references the bin directory yet, one
//! `export PATH` line is appended to the first candidate, creating it and
//! its parent directories when needed. The live process PATH is never
//! mutated; the export only takes effect in new shell sessions.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{InstallerError, Result};
use crate::steps::LogSink;

use super::{live_path_contains, PathPersistence, PersistOutcome};

/// Shell startup file backend.
pub struct PosixPathBackend {
    home: PathBuf,
    shell: String,
}

impl PosixPathBackend {
    /// Build the backend from `$SHELL` and the user's home directory.
    pub fn from_env() -> Result<Self> {
        let home = dirs::home_dir().ok_or(InstallerError::HomeDirUnresolvable)?;
        let shell = std::env::var("SHELL").unwrap_or_default();
        Ok(Self::new(home, &shell))
    }

    /// Build the backend for a specific home directory and shell path.
    pub fn new(home: PathBuf, shell: &str) -> Self {
        let shell = Path::new(shell)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();
        Self { home, shell }
    }

    /// Candidate startup files for the user's shell, in preference order.
    pub fn rc_candidates(&self) -> Vec<PathBuf> {
        match self.shell.as_str() {
            "zsh" => vec![self.home.join(".zshrc")],
            "bash" => vec![self.home.join(".bashrc"), self.home.join(".bash_profile")],
            "fish" => vec![self.home.join(".config/fish/config.fish")],
            _ => vec![self.home.join(".profile")],
        }
    }

    /// The first candidate file that already references the directory.
    fn containing_rc(&self, dir: &Path) -> Option<PathBuf> {
        let needle = dir.to_string_lossy();
        self.rc_candidates()
            .into_iter()
            .find(|rc| file_contains(rc, &needle))
    }

    fn export_line(dir: &Path) -> String {
        format!("export PATH=\"{}:$PATH\"", dir.display())
    }
}

impl PathPersistence for PosixPathBackend {
    fn is_persisted(&self, dir: &Path) -> Result<bool> {
        Ok(self.containing_rc(dir).is_some())
    }

    fn persist(&self, dir: &Path, sink: &mut LogSink) -> Result<PersistOutcome> {
        let rc = self.rc_candidates().remove(0);

        if let Some(parent) = rc.parent() {
            fs::create_dir_all(parent).map_err(|source| InstallerError::FileIOFailure {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&rc)
            .map_err(|source| InstallerError::FileIOFailure {
                path: rc.clone(),
                source,
            })?;

        writeln!(file, "\n{}", Self::export_line(dir)).map_err(|source| {
            InstallerError::FileIOFailure {
                path: rc.clone(),
                source,
            }
        })?;

        sink.line(format!(
            "Added {} to PATH in {} (takes effect in new shells)",
            dir.display(),
            rc.display()
        ));
        Ok(PersistOutcome::Updated)
    }

    fn ensure(&self, dir: &Path, sink: &mut LogSink) -> Result<PersistOutcome> {
        if live_path_contains(dir) {
            sink.line(format!(
                "{} is already on the current session PATH",
                dir.display()
            ));
        }

        if let Some(rc) = self.containing_rc(dir) {
            sink.line(format!("{} already references {}", rc.display(), dir.display()));
            return Ok(PersistOutcome::Unchanged);
        }

        self.persist(dir, sink)
    }
}

/// Line-based containment check; unreadable or missing files read as false.
fn file_contains(path: &Path, needle: &str) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    BufReader::new(file)
        .lines()
        .map_while(std::result::Result::ok)
        .any(|line| line.contains(needle))
}
