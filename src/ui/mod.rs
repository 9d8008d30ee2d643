//! Terminal presentation.
//!
//! This module renders pipeline progress; it subscribes to step transitions
//! through [`PipelineObserver`](crate::steps::PipelineObserver) and never
//! mutates core state.
//!
//! - [`StepRenderer`] - spinner-driven step display with live output lines
//! - [`InstallerTheme`] - console styles, with a plain variant for
//!   `--no-color` and non-TTY output

pub mod render;
pub mod theme;

pub use render::StepRenderer;
pub use theme::{should_use_colors, InstallerTheme};
