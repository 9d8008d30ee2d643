//! The pipeline event loop.
//!
//! [`Pipeline`] owns the step list and is the only writer to it. Each step's
//! operation is dispatched onto its own worker thread; output lines and the
//! completion result come back over a single channel and are processed here,
//! in order, on the caller's thread. A failure marks the pipeline terminal
//! immediately and later steps stay Pending.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use tracing::debug;

use super::{LogSink, PipelineEvent, PipelineObserver, Step, StepStatus, StepView};

/// Sequential executor for an ordered list of steps.
pub struct Pipeline {
    steps: Vec<Step>,
    current: usize,
    terminal: bool,
    failed: bool,
    started: bool,
    tx: Sender<PipelineEvent>,
    rx: Receiver<PipelineEvent>,
    worker: Option<JoinHandle<()>>,
}

impl Pipeline {
    /// Create a pipeline over a fixed step list. Insertion order is
    /// execution order.
    pub fn new(steps: Vec<Step>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            steps,
            current: 0,
            terminal: false,
            failed: false,
            started: false,
            tx,
            rx,
            worker: None,
        }
    }

    /// Begin executing the first step. No-op if already started. An empty
    /// pipeline is immediately terminal and successful.
    pub fn start(&mut self, observer: &mut dyn PipelineObserver) {
        if self.started {
            return;
        }
        self.started = true;

        if self.steps.is_empty() {
            self.terminal = true;
            observer.pipeline_finished(true, &self.snapshot());
            return;
        }

        self.dispatch(0, observer);
    }

    /// Process completion events until the pipeline is terminal. Returns
    /// true when every step succeeded.
    pub fn wait(&mut self, observer: &mut dyn PipelineObserver) -> bool {
        while !self.terminal {
            match self.rx.recv() {
                Ok(PipelineEvent::Line { step, line }) => {
                    self.steps[step].append_line(line.clone());
                    observer.step_line(step, &line);
                }
                Ok(PipelineEvent::Done { step, result }) => {
                    self.complete_step(step, result, observer);
                }
                Err(_) => break,
            }
        }

        !self.failed
    }

    /// Run the pipeline to completion. Returns true when every step
    /// succeeded.
    pub fn run(&mut self, observer: &mut dyn PipelineObserver) -> bool {
        self.start(observer);
        self.wait(observer)
    }

    /// Number of steps in the pipeline.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the pipeline holds no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the step currently running or about to run.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Whether any step failed or all steps finished.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Whether the pipeline ended in failure.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Read-only snapshot of every step.
    pub fn snapshot(&self) -> Vec<StepView> {
        self.steps.iter().map(Step::view).collect()
    }

    fn dispatch(&mut self, index: usize, observer: &mut dyn PipelineObserver) {
        let total = self.steps.len();
        let step = &mut self.steps[index];
        step.set_status(StepStatus::Running);
        debug!(step = step.name(), index, "dispatching step");
        observer.step_started(index, total, step.name());

        let operation = step
            .take_operation()
            .expect("step operation already taken");
        let mut sink = LogSink::new(index, self.tx.clone());
        let tx = self.tx.clone();

        self.worker = Some(std::thread::spawn(move || {
            let result = operation(&mut sink);
            let _ = tx.send(PipelineEvent::Done {
                step: index,
                result,
            });
        }));
    }

    fn complete_step(
        &mut self,
        index: usize,
        result: crate::Result<()>,
        observer: &mut dyn PipelineObserver,
    ) {
        // Completions arrive in dispatch order; nothing to do for a step
        // that is not the cursor.
        if index != self.current {
            return;
        }

        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }

        match result {
            Ok(()) => {
                self.steps[index].set_status(StepStatus::Success);
                observer.step_finished(index, &self.steps[index].view());

                self.current += 1;
                if self.current < self.steps.len() {
                    self.dispatch(self.current, observer);
                } else {
                    self.terminal = true;
                    observer.pipeline_finished(true, &self.snapshot());
                }
            }
            Err(err) => {
                debug!(step = self.steps[index].name(), %err, "step failed");
                self.steps[index].set_status(StepStatus::Failed);
                self.steps[index].set_failure(err.to_string());
                observer.step_finished(index, &self.steps[index].view());

                self.terminal = true;
                self.failed = true;
                observer.pipeline_finished(false, &self.snapshot());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InstallerError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Observer that records every notification it receives.
    #[derive(Default)]
    struct RecordingObserver {
        started: Vec<String>,
        lines: Vec<(usize, String)>,
        finished: Vec<(String, StepStatus)>,
        outcome: Option<bool>,
    }

    impl PipelineObserver for RecordingObserver {
        fn step_started(&mut self, _index: usize, _total: usize, name: &str) {
            self.started.push(name.to_string());
        }

        fn step_line(&mut self, index: usize, line: &str) {
            self.lines.push((index, line.to_string()));
        }

        fn step_finished(&mut self, _index: usize, step: &StepView) {
            self.finished.push((step.name.clone(), step.status));
        }

        fn pipeline_finished(&mut self, success: bool, _steps: &[StepView]) {
            self.outcome = Some(success);
        }
    }

    #[test]
    fn executes_steps_in_declared_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let steps = ["a", "b", "c"]
            .into_iter()
            .map(|name| {
                let order = Arc::clone(&order);
                Step::new(name, move |_| {
                    order.lock().unwrap().push(name);
                    Ok(())
                })
            })
            .collect();

        let mut pipeline = Pipeline::new(steps);
        assert!(pipeline.run(&mut ()));
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn all_success_leaves_cursor_past_the_end() {
        let steps = vec![Step::new("a", |_| Ok(())), Step::new("b", |_| Ok(()))];
        let mut pipeline = Pipeline::new(steps);

        assert!(pipeline.run(&mut ()));
        assert!(pipeline.is_terminal());
        assert!(!pipeline.is_failed());
        assert_eq!(pipeline.current_index(), pipeline.len());
        assert!(pipeline
            .snapshot()
            .iter()
            .all(|s| s.status == StepStatus::Success));
    }

    #[test]
    fn failure_halts_and_later_steps_stay_pending() {
        let ran_third = Arc::new(AtomicUsize::new(0));
        let ran = Arc::clone(&ran_third);

        let steps = vec![
            Step::new("a", |_| Ok(())),
            Step::new("b", |_| Err(InstallerError::ToolchainMissing)),
            Step::new("c", move |_| {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        ];

        let mut pipeline = Pipeline::new(steps);
        assert!(!pipeline.run(&mut ()));
        assert!(pipeline.is_terminal());
        assert!(pipeline.is_failed());
        assert_eq!(pipeline.current_index(), 1);
        assert_eq!(ran_third.load(Ordering::SeqCst), 0);

        let views = pipeline.snapshot();
        assert_eq!(views[0].status, StepStatus::Success);
        assert_eq!(views[1].status, StepStatus::Failed);
        assert_eq!(views[2].status, StepStatus::Pending);
    }

    #[test]
    fn failure_reason_present_iff_failed() {
        let steps = vec![
            Step::new("ok", |_| Ok(())),
            Step::new("bad", |_| Err(InstallerError::HomeDirUnresolvable)),
        ];

        let mut pipeline = Pipeline::new(steps);
        pipeline.run(&mut ());

        let views = pipeline.snapshot();
        assert!(views[0].failure.is_none());
        let reason = views[1].failure.as_deref().unwrap();
        assert!(reason.contains("home directory"));
    }

    #[test]
    fn captured_output_preserves_line_order() {
        let steps = vec![Step::new("chatty", |sink: &mut LogSink| {
            sink.line("first");
            sink.line("second");
            sink.line("third");
            Ok(())
        })];

        let mut pipeline = Pipeline::new(steps);
        pipeline.run(&mut ());

        let views = pipeline.snapshot();
        assert_eq!(views[0].log, vec!["first", "second", "third"]);
    }

    #[test]
    fn output_lines_are_processed_before_completion() {
        let mut observer = RecordingObserver::default();
        let steps = vec![Step::new("chatty", |sink: &mut LogSink| {
            sink.line("progress");
            Ok(())
        })];

        Pipeline::new(steps).run(&mut observer);

        assert_eq!(observer.lines, vec![(0, "progress".to_string())]);
        assert_eq!(
            observer.finished,
            vec![("chatty".to_string(), StepStatus::Success)]
        );
    }

    #[test]
    fn start_is_a_noop_when_already_started() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let steps = vec![Step::new("once", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })];

        let mut pipeline = Pipeline::new(steps);
        pipeline.start(&mut ());
        pipeline.start(&mut ());
        assert!(pipeline.wait(&mut ()));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_pipeline_is_immediately_successful() {
        let mut observer = RecordingObserver::default();
        let mut pipeline = Pipeline::new(Vec::new());

        assert!(pipeline.run(&mut observer));
        assert!(pipeline.is_terminal());
        assert_eq!(observer.outcome, Some(true));
    }

    #[test]
    fn observer_sees_transitions_in_order() {
        let mut observer = RecordingObserver::default();
        let steps = vec![
            Step::new("a", |_| Ok(())),
            Step::new("b", |_| Err(InstallerError::ToolchainMissing)),
        ];

        Pipeline::new(steps).run(&mut observer);

        assert_eq!(observer.started, vec!["a", "b"]);
        assert_eq!(
            observer.finished,
            vec![
                ("a".to_string(), StepStatus::Success),
                ("b".to_string(), StepStatus::Failed),
            ]
        );
        assert_eq!(observer.outcome, Some(false));
    }
}
