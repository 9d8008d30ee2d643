//! Error types for installer operations.
//!
//! This module defines [`InstallerError`], the primary error type used
//! throughout the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `InstallerError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `InstallerError::Other`) for unexpected errors
//! - Every error raised inside a step is captured by the pipeline, shown to
//!   the user as the step's failure reason, and halts the run

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for installer operations.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The Go toolchain executable could not be located on PATH.
    #[error("Go toolchain not found. Install it from https://go.dev/dl and re-run this installer")]
    ToolchainMissing,

    /// The toolchain was found but querying it failed.
    #[error("unable to query the Go toolchain: {message}")]
    ToolchainQueryFailed { message: String },

    /// No bin directory could be resolved from GOBIN, GOPATH, or the home directory.
    #[error("cannot determine the install bin directory (GOBIN and GOPATH are unset and no home directory was found)")]
    BinDirUnresolvable,

    /// The home directory could not be resolved for a PATH update.
    #[error("cannot determine home directory for PATH update")]
    HomeDirUnresolvable,

    /// A file operation on a shell startup file or the bin directory failed.
    #[error("file operation failed on {path}: {source}")]
    FileIOFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The per-user environment store could not be read.
    #[error("failed to read the user Path from the registry: {message}")]
    RegistryReadFailure { message: String },

    /// The per-user environment store could not be written.
    #[error("failed to write the user Path to the registry: {message}")]
    RegistryWriteFailure { message: String },

    /// `go install` exited non-zero.
    #[error("'go install {module}@{version}' failed with exit code {code:?}")]
    InstallCommandFailed {
        module: String,
        version: String,
        code: Option<i32>,
        output: String,
    },

    /// The installed binary is neither on PATH nor at the expected location.
    #[error("'{binary}' not found at {candidate} and not on PATH yet")]
    BinaryNotFound { binary: String, candidate: PathBuf },

    /// The installed binary exists at the expected location but failed to run.
    #[error("failed running '{candidate} version': {message}")]
    BinaryExecutionFailed { candidate: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for installer operations.
pub type Result<T> = std::result::Result<T, InstallerError>;
