//! cairn-installer - interactive installer for the cairn CLI.
//!
//! The installer provisions cairn by driving the Go toolchain through a
//! fixed pipeline of steps: probe the toolchain, prepare the bin directory,
//! persist that directory onto the user's PATH, run `go install`, and verify
//! the installed binary actually runs. Each step executes on a worker thread
//! while a terminal renderer shows live progress.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`error`] - Error types and result aliases
//! - [`install`] - Toolchain probing, `go install` execution, and verification
//! - [`pathenv`] - Durable PATH persistence (shell rc files, user registry)
//! - [`shell`] - Child process execution with line streaming
//! - [`steps`] - Step pipeline types and the orchestrating event loop
//! - [`ui`] - Terminal theme and the step progress renderer

pub mod cli;
pub mod error;
pub mod install;
pub mod pathenv;
pub mod shell;
pub mod steps;
pub mod ui;

pub use error::{InstallerError, Result};
