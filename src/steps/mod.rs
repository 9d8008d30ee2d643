//! Step pipeline types and the orchestrating event loop.
//!
//! An installation run is a fixed, ordered list of [`Step`]s executed one at
//! a time by a [`Pipeline`](runner::Pipeline). Step operations run on worker
//! threads and report back through a channel; only the pipeline's event loop
//! ever mutates step state. A presentation layer observes transitions through
//! [`PipelineObserver`] and gets read-only [`StepView`] snapshots.

pub mod runner;

pub use runner::Pipeline;

use std::sync::mpsc::Sender;

use crate::error::Result;

/// Execution state of a single step. Transitions are monotonic: a step goes
/// Pending to Running to exactly one of Success or Failed, and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Step is waiting to run.
    Pending,

    /// Step is currently executing on a worker thread.
    Running,

    /// Step completed successfully.
    Success,

    /// Step failed; the pipeline halted here.
    Failed,
}

impl StepStatus {
    /// Check if this is a terminal state (no more changes expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Success | StepStatus::Failed)
    }

    /// Get a display character for this status.
    pub fn display_char(&self) -> char {
        match self {
            StepStatus::Pending => '○',
            StepStatus::Running => '◉',
            StepStatus::Success => '✓',
            StepStatus::Failed => '✗',
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Success => "success",
            StepStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// A step's operation: runs on a worker thread, writes progress lines to the
/// sink, and reports success or failure through its return value. Operations
/// never touch pipeline state directly.
pub type StepFn = Box<dyn FnOnce(&mut LogSink) -> Result<()> + Send + 'static>;

/// One named, independently fallible unit of the installation pipeline.
pub struct Step {
    name: String,
    operation: Option<StepFn>,
    status: StepStatus,
    log: Vec<String>,
    failure: Option<String>,
}

impl Step {
    /// Create a pending step from a name and its operation.
    pub fn new<F>(name: impl Into<String>, operation: F) -> Self
    where
        F: FnOnce(&mut LogSink) -> Result<()> + Send + 'static,
    {
        Self {
            name: name.into(),
            operation: Some(Box::new(operation)),
            status: StepStatus::Pending,
            log: Vec::new(),
            failure: None,
        }
    }

    /// The step's human-readable label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current execution state.
    pub fn status(&self) -> StepStatus {
        self.status
    }

    /// Captured output lines, in the order they were produced.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Failure reason, present only when the step failed.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Produce a read-only snapshot of this step.
    pub fn view(&self) -> StepView {
        StepView {
            name: self.name.clone(),
            status: self.status,
            log: self.log.clone(),
            failure: self.failure.clone(),
        }
    }

    pub(crate) fn set_status(&mut self, status: StepStatus) {
        self.status = status;
    }

    pub(crate) fn append_line(&mut self, line: String) {
        self.log.push(line);
    }

    pub(crate) fn set_failure(&mut self, reason: String) {
        self.failure = Some(reason);
    }

    pub(crate) fn take_operation(&mut self) -> Option<StepFn> {
        self.operation.take()
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("status", &self.status)
            .field("log", &self.log)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

/// Read-only snapshot of one step, safe to hand to a presentation layer.
#[derive(Debug, Clone)]
pub struct StepView {
    /// Step name.
    pub name: String,

    /// Status at snapshot time.
    pub status: StepStatus,

    /// Captured output lines.
    pub log: Vec<String>,

    /// Failure reason, present iff `status` is Failed.
    pub failure: Option<String>,
}

/// Messages delivered from worker threads to the pipeline's event loop.
///
/// Both variants for a given step travel over the same sender from the same
/// thread, so every output line is processed before that step's completion.
#[derive(Debug)]
pub(crate) enum PipelineEvent {
    /// A step produced one line of output.
    Line { step: usize, line: String },

    /// A step's operation returned.
    Done {
        step: usize,
        result: Result<()>,
    },
}

/// Writable output sink handed to step operations.
///
/// Lines are forwarded to the pipeline's event loop, which appends them to
/// the owning step's captured log and relays them to the observer.
pub struct LogSink {
    step: usize,
    tx: Sender<PipelineEvent>,
}

impl LogSink {
    pub(crate) fn new(step: usize, tx: Sender<PipelineEvent>) -> Self {
        Self { step, tx }
    }

    /// Emit one line of progress output.
    pub fn line(&mut self, text: impl Into<String>) {
        let _ = self.tx.send(PipelineEvent::Line {
            step: self.step,
            line: text.into(),
        });
    }
}

/// Observer contract for a presentation layer.
///
/// Implementations receive transitions as they happen and must not reach
/// back into pipeline state; everything they need arrives in the arguments.
pub trait PipelineObserver {
    /// A step moved from Pending to Running.
    fn step_started(&mut self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// A running step produced one line of output.
    fn step_line(&mut self, index: usize, line: &str) {
        let _ = (index, line);
    }

    /// A step reached a terminal status.
    fn step_finished(&mut self, index: usize, step: &StepView) {
        let _ = (index, step);
    }

    /// The whole pipeline reached a terminal state.
    fn pipeline_finished(&mut self, success: bool, steps: &[StepView]) {
        let _ = (success, steps);
    }
}

/// No-op observer, handy when no presentation layer is attached.
impl PipelineObserver for () {}
