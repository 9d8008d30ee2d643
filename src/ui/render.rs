//! Terminal renderer for pipeline progress.
//!
//! Implements [`PipelineObserver`] over indicatif: the running step shows a
//! spinner whose message carries a small ring buffer of its most recent
//! output lines, finished steps collapse to a single themed status line,
//! and the run ends with either a hint or the failing step's full log.
//! The renderer holds no pipeline state beyond what arrives in the
//! notifications.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use crate::steps::{PipelineObserver, StepStatus, StepView};

use super::theme::{should_use_colors, InstallerTheme};

/// How many live output lines ride along under the spinner.
const LIVE_LINES: usize = 3;

/// Step progress renderer.
pub struct StepRenderer {
    theme: InstallerTheme,
    verbose: bool,
    bar: Option<ProgressBar>,
    base_message: String,
    recent: VecDeque<String>,
    started_at: Option<Instant>,
}

impl StepRenderer {
    /// Create a renderer; colors follow `NO_COLOR` and TTY detection.
    pub fn new(verbose: bool) -> Self {
        let theme = if should_use_colors() {
            InstallerTheme::new()
        } else {
            InstallerTheme::plain()
        };
        Self {
            theme,
            verbose,
            bar: None,
            base_message: String::new(),
            recent: VecDeque::new(),
            started_at: None,
        }
    }

    /// Print the run banner.
    pub fn show_header(&self, module: &str, version: &str) {
        println!("{}", self.theme.format_header("Cairn Installer"));
        println!(
            "  {}",
            self.theme
                .dim
                .apply_to(format!("Package: {}  Version: {}", module, version))
        );
        println!();
    }

    fn compose_message(&self) -> String {
        let mut msg = self.base_message.clone();
        for line in &self.recent {
            msg.push('\n');
            msg.push_str("    ");
            msg.push_str(&self.theme.dim.apply_to(format!("» {}", line)).to_string());
        }
        msg
    }
}

impl PipelineObserver for StepRenderer {
    fn step_started(&mut self, index: usize, total: usize, name: &str) {
        let counter = self.theme.step_number.apply_to(format!("[{}/{}]", index + 1, total));
        self.base_message = format!("{} {}", counter, name);
        self.recent.clear();
        self.started_at = Some(Instant::now());

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.magenta} {msg}")
                .unwrap(),
        );
        bar.set_message(self.base_message.clone());
        bar.enable_steady_tick(Duration::from_millis(80));
        self.bar = Some(bar);
    }

    fn step_line(&mut self, _index: usize, line: &str) {
        let text = line.trim_end();
        if text.is_empty() {
            return;
        }

        let display = if text.chars().count() > 72 {
            format!("{}...", text.chars().take(69).collect::<String>())
        } else {
            text.to_string()
        };

        if let Some(bar) = &self.bar {
            if self.verbose {
                bar.println(format!("    {}", self.theme.dim.apply_to(text)));
            }
            self.recent.push_back(display);
            while self.recent.len() > LIVE_LINES {
                self.recent.pop_front();
            }
            bar.set_message(self.compose_message());
        }
    }

    fn step_finished(&mut self, _index: usize, step: &StepView) {
        let Some(bar) = self.bar.take() else {
            return;
        };

        let elapsed = self
            .started_at
            .take()
            .map(|t| format!(" ({})", format_duration(t.elapsed())))
            .unwrap_or_default();

        bar.set_style(ProgressStyle::default_spinner().template("{msg}").unwrap());
        match step.status {
            StepStatus::Failed => {
                let reason = step.failure.as_deref().unwrap_or("unknown error");
                bar.finish_with_message(
                    self.theme.format_error(&format!("{} - {}", step.name, reason)),
                );
            }
            _ => {
                bar.finish_with_message(format!(
                    "{}{}",
                    self.theme.format_success(&step.name),
                    self.theme.duration.apply_to(elapsed)
                ));
            }
        }
    }

    fn pipeline_finished(&mut self, success: bool, steps: &[StepView]) {
        println!();
        if success {
            println!("{}", self.theme.format_success("All steps complete"));
            println!(
                "{}",
                self.theme.hint.apply_to(
                    "If PATH was updated, open a new terminal and run: cairn version"
                )
            );
            return;
        }

        // Show the failing step's captured output in full; the spinner only
        // carried its last few lines.
        if let Some(failed) = steps.iter().find(|s| s.status == StepStatus::Failed) {
            println!(
                "{}",
                self.theme
                    .format_error(&format!("Installation failed during '{}'", failed.name))
            );
            for line in &failed.log {
                println!("  {}", self.theme.dim.apply_to(line));
            }
            if let Some(reason) = &failed.failure {
                println!("  {}", self.theme.error.apply_to(reason));
            }
        }
    }
}

/// Render a duration the way a human scans it.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{}s", secs, millis / 100)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(name: &str, status: StepStatus) -> StepView {
        StepView {
            name: name.to_string(),
            status,
            log: vec!["line".to_string()],
            failure: match status {
                StepStatus::Failed => Some("boom".to_string()),
                _ => None,
            },
        }
    }

    #[test]
    fn renderer_survives_a_full_step_cycle() {
        let mut renderer = StepRenderer::new(false);
        renderer.step_started(0, 5, "Check Go toolchain");
        renderer.step_line(0, "Found go version go1.22.5 linux/amd64");
        renderer.step_finished(0, &view("Check Go toolchain", StepStatus::Success));
    }

    #[test]
    fn renderer_survives_failure_and_summary() {
        let mut renderer = StepRenderer::new(true);
        renderer.step_started(0, 1, "Install cairn");
        renderer.step_line(0, "module not found");
        let failed = view("Install cairn", StepStatus::Failed);
        renderer.step_finished(0, &failed);
        renderer.pipeline_finished(false, &[failed]);
    }

    #[test]
    fn long_lines_are_truncated_for_the_spinner() {
        let mut renderer = StepRenderer::new(false);
        renderer.step_started(0, 1, "Install cairn");
        renderer.step_line(0, &"x".repeat(100));
        let composed = renderer.compose_message();
        assert!(composed.contains("..."));
        assert!(!composed.contains(&"x".repeat(100)));
        renderer.step_finished(0, &view("Install cairn", StepStatus::Success));
    }

    #[test]
    fn ring_buffer_keeps_only_recent_lines() {
        let mut renderer = StepRenderer::new(false);
        renderer.step_started(0, 1, "Install cairn");
        for i in 0..6 {
            renderer.step_line(0, &format!("line {}", i));
        }
        assert_eq!(renderer.recent.len(), LIVE_LINES);
        assert_eq!(renderer.recent.front().map(String::as_str), Some("line 3"));
        renderer.step_finished(0, &view("Install cairn", StepStatus::Success));
    }

    #[test]
    fn format_duration_scales_units() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
    }
}
