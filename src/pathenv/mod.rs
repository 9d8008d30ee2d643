//! Durable PATH persistence.
//!
//! One capability with two incompatible mechanisms: on POSIX systems the
//! bin directory is appended as an `export` line to the user's shell
//! startup file; on Windows the per-user `Path` value in the registry is
//! rewritten wholesale. [`PathPersistence`] is the seam, selected once at
//! startup by [`platform_backend`]; everything else in the installer
//! depends only on the trait.
//!
//! Membership checks never use raw string equality. Entries are compared
//! absolute and with trailing separators stripped, case-insensitively on
//! Windows, so `/home/u/go/bin/` matches `/home/u/go/bin` and
//! `c:\Go\Bin\` matches `C:\go\bin`.

#[cfg(not(windows))]
pub mod posix;
#[cfg(windows)]
pub mod windows;

use std::path::Path;

use crate::error::Result;
use crate::steps::LogSink;

/// How a persistence request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The persisted PATH already contained the directory; nothing written.
    Unchanged,

    /// The directory was written to the persisted PATH.
    Updated,

    /// The persisted store could not be updated, but the live session PATH
    /// already contains the directory. The change may not survive a new
    /// terminal.
    SessionOnly,
}

/// Platform seam for durably adding a directory to the user's search path.
pub trait PathPersistence {
    /// Whether the persisted PATH already references the directory.
    fn is_persisted(&self, dir: &Path) -> Result<bool>;

    /// Write the directory into the persisted PATH. Callers are expected
    /// to have checked membership first; `ensure` does both.
    fn persist(&self, dir: &Path, sink: &mut LogSink) -> Result<PersistOutcome>;

    /// Make the directory durably present: a write happens if and only if
    /// the persisted PATH does not already contain it.
    fn ensure(&self, dir: &Path, sink: &mut LogSink) -> Result<PersistOutcome> {
        if self.is_persisted(dir)? {
            sink.line(format!(
                "Persisted PATH already contains {}",
                dir.display()
            ));
            return Ok(PersistOutcome::Unchanged);
        }
        self.persist(dir, sink)
    }
}

/// Decision derived from a persisted PATH list: whether the directory is
/// already present, and the rewritten value when it is not.
///
/// Only the Windows store is rewritten wholesale, so the list separator is
/// `;`. POSIX persistence appends an export line instead and never builds
/// an updated value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMutationDecision {
    /// The directory is already on the persisted list.
    pub already_present: bool,

    /// The new persisted value, present iff a write is required.
    pub updated_value: Option<String>,
}

impl PathMutationDecision {
    /// Compute the decision for appending `dir` to a `;`-separated list.
    pub fn compute(current: &str, dir: &Path, case_insensitive: bool) -> Self {
        if list_contains(current, dir, case_insensitive) {
            return Self {
                already_present: true,
                updated_value: None,
            };
        }

        let trimmed = current.trim().trim_matches(';');
        let dir = dir.to_string_lossy();
        let updated = if trimmed.is_empty() {
            dir.into_owned()
        } else {
            format!("{};{}", trimmed, dir)
        };

        Self {
            already_present: false,
            updated_value: Some(updated),
        }
    }
}

/// Whether a `;`-separated persisted list contains the directory, under
/// normalized comparison.
pub(crate) fn list_contains(list: &str, dir: &Path, case_insensitive: bool) -> bool {
    let target = match normalize_entry(&dir.to_string_lossy(), case_insensitive) {
        Some(t) => t,
        None => return false,
    };

    list.split(';')
        .filter_map(|entry| normalize_entry(entry, case_insensitive))
        .any(|entry| entry == target)
}

/// Whether the live session PATH of this process contains the directory.
pub fn live_path_contains(dir: &Path) -> bool {
    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|entry| same_dir(&entry, dir))
}

/// Compare two directories under this platform's normalization rules.
pub(crate) fn same_dir(a: &Path, b: &Path) -> bool {
    let case_insensitive = cfg!(windows);
    match (
        normalize_entry(&a.to_string_lossy(), case_insensitive),
        normalize_entry(&b.to_string_lossy(), case_insensitive),
    ) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Normalize one search-path entry for comparison: trim whitespace and
/// trailing separators, resolve relative entries against the current
/// directory, and fold case when asked. Rooted and drive-letter entries
/// are taken verbatim.
fn normalize_entry(raw: &str, case_insensitive: bool) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut entry = if is_rooted(trimmed) {
        trimmed.to_string()
    } else {
        std::path::absolute(trimmed)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| trimmed.to_string())
    };

    while entry.len() > 1 && (entry.ends_with('/') || entry.ends_with('\\')) {
        entry.pop();
    }

    if case_insensitive {
        entry = entry.to_lowercase();
    }

    Some(entry)
}

fn is_rooted(entry: &str) -> bool {
    entry.starts_with('/')
        || entry.starts_with('\\')
        || (entry.len() >= 2 && entry.as_bytes()[1] == b':')
}

/// Select the persistence backend for the platform this process runs on.
#[cfg(not(windows))]
pub fn platform_backend() -> Result<Box<dyn PathPersistence>> {
    Ok(Box::new(posix::PosixPathBackend::from_env()?))
}

/// Select the persistence backend for the platform this process runs on.
#[cfg(windows)]
pub fn platform_backend() -> Result<Box<dyn PathPersistence>> {
    Ok(Box::new(windows::WindowsPathBackend::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::PipelineEvent;
    use std::cell::RefCell;
    use std::sync::mpsc::{self, Receiver};

    fn test_sink() -> (LogSink, Receiver<PipelineEvent>) {
        let (tx, rx) = mpsc::channel();
        (LogSink::new(0, tx), rx)
    }

    #[test]
    fn decision_skips_write_when_already_present() {
        let decision = PathMutationDecision::compute(
            r"C:\Windows;C:\go\bin",
            Path::new(r"C:\go\bin"),
            true,
        );
        assert!(decision.already_present);
        assert_eq!(decision.updated_value, None);
    }

    #[test]
    fn decision_is_normalized_for_case_and_trailing_separator() {
        let decision = PathMutationDecision::compute(
            r"C:\Windows;c:\Go\Bin\",
            Path::new(r"C:\go\bin"),
            true,
        );
        assert!(decision.already_present);
    }

    #[test]
    fn decision_appends_when_absent() {
        let decision =
            PathMutationDecision::compute(r"C:\Windows", Path::new(r"C:\go\bin"), true);
        assert!(!decision.already_present);
        assert_eq!(decision.updated_value.as_deref(), Some(r"C:\Windows;C:\go\bin"));
    }

    #[test]
    fn decision_handles_empty_list() {
        let decision = PathMutationDecision::compute("", Path::new(r"C:\go\bin"), true);
        assert!(!decision.already_present);
        assert_eq!(decision.updated_value.as_deref(), Some(r"C:\go\bin"));
    }

    #[test]
    fn decision_drops_stray_separators_before_appending() {
        let decision =
            PathMutationDecision::compute(r"C:\Windows;", Path::new(r"C:\go\bin"), true);
        assert_eq!(decision.updated_value.as_deref(), Some(r"C:\Windows;C:\go\bin"));
    }

    #[test]
    fn case_matters_when_asked_for() {
        assert!(!list_contains(
            "/home/u/Go/Bin",
            Path::new("/home/u/go/bin"),
            false
        ));
        assert!(list_contains(
            "/home/u/go/bin",
            Path::new("/home/u/go/bin"),
            false
        ));
    }

    #[test]
    fn trailing_slash_does_not_defeat_membership() {
        assert!(list_contains(
            "/usr/bin;/home/u/go/bin/",
            Path::new("/home/u/go/bin"),
            false
        ));
    }

    #[test]
    fn blank_entries_are_ignored() {
        assert!(!list_contains(" ; ;", Path::new("/home/u/go/bin"), false));
    }

    #[test]
    fn same_dir_strips_trailing_separators() {
        assert!(same_dir(
            Path::new("/home/u/go/bin/"),
            Path::new("/home/u/go/bin")
        ));
    }

    #[test]
    fn live_path_contains_finds_existing_entry() {
        let path = std::env::var("PATH").unwrap_or_default();
        let Some(first) = std::env::split_paths(&path).next() else {
            return;
        };
        assert!(live_path_contains(&first));
    }

    #[test]
    fn live_path_misses_nonexistent_entry() {
        assert!(!live_path_contains(Path::new("/definitely/not/on/path/xyz")));
    }

    /// Backend that records persist calls, for exercising the default
    /// `ensure` logic.
    struct FakeBackend {
        persisted: bool,
        writes: RefCell<usize>,
    }

    impl PathPersistence for FakeBackend {
        fn is_persisted(&self, _dir: &Path) -> Result<bool> {
            Ok(self.persisted)
        }

        fn persist(&self, _dir: &Path, _sink: &mut LogSink) -> Result<PersistOutcome> {
            *self.writes.borrow_mut() += 1;
            Ok(PersistOutcome::Updated)
        }
    }

    #[test]
    fn ensure_writes_iff_absent() {
        let (mut sink, _rx) = test_sink();

        let present = FakeBackend {
            persisted: true,
            writes: RefCell::new(0),
        };
        let outcome = present.ensure(Path::new("/home/u/go/bin"), &mut sink).unwrap();
        assert_eq!(outcome, PersistOutcome::Unchanged);
        assert_eq!(*present.writes.borrow(), 0);

        let absent = FakeBackend {
            persisted: false,
            writes: RefCell::new(0),
        };
        let outcome = absent.ensure(Path::new("/home/u/go/bin"), &mut sink).unwrap();
        assert_eq!(outcome, PersistOutcome::Updated);
        assert_eq!(*absent.writes.borrow(), 1);
    }
}
