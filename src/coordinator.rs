//! Pipeline coordinator.
//!
//! Runs the row producer and the streaming renderer as two scoped threads
//! connected by a bounded channel, and turns their results into exactly one
//! outcome per run:
//!
//! ```text
//! Idle -> Running -> Completed
//!                 -> Failed
//! ```
//!
//! The first primary error from either side wins. Recording it also sets the
//! shared cancellation token, so the other side stops promptly: the producer
//! checks the token between fetches and the renderer sees the stream abort.

use std::any::Any;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::channel::{self, ChannelStats, StreamReceiver};
use crate::error::{PipelineError, Result};
use crate::producer::produce;
use crate::record::{DEFAULT_DELIMITER, Line, Record};
use crate::renderer::{render_lines, render_records};
use crate::source::{RowPayload, RowSource};
use crate::template::RowTemplate;

/// Unit of data crossing the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamMode {
    /// One structured `Record` per row, decoded field by field.
    #[default]
    Records,
    /// One pre-joined `Line` per row, formatted by the row source.
    Lines,
}

/// Settings for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub mode: StreamMode,
    /// Buffered items allowed in the channel; 0 is a synchronous handoff.
    pub capacity: usize,
    /// Field separator for `StreamMode::Lines`.
    pub delimiter: char,
    /// Cancel the run when this much time has passed since it started.
    pub timeout: Option<Duration>,
    pub template: RowTemplate,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: StreamMode::Records,
            capacity: 0,
            delimiter: DEFAULT_DELIMITER,
            timeout: None,
            template: RowTemplate::markdown(),
        }
    }
}

impl PipelineConfig {
    pub fn with_mode(mut self, mode: StreamMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_template(mut self, template: RowTemplate) -> Self {
        self.template = template;
        self
    }
}

/// Lifecycle of the most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// What a successful run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub rows_produced: u64,
    pub rows_rendered: u64,
    pub channel: ChannelStats,
    pub elapsed: Duration,
}

/// Launches and supervises pipeline runs.
#[derive(Debug, Default)]
pub struct Coordinator {
    config: PipelineConfig,
    state: RunState,
}

impl Coordinator {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            state: RunState::Idle,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Stream every row of `source` into `sink`.
    pub fn run<S, W>(&mut self, source: &mut S, sink: &mut W) -> Result<RunSummary>
    where
        S: RowSource + Send + ?Sized,
        W: Write + Send + ?Sized,
    {
        self.run_with_cancel(source, sink, CancelToken::new())
    }

    /// Like [`run`](Self::run), but the caller can cancel through `cancel`.
    pub fn run_with_cancel<S, W>(
        &mut self,
        source: &mut S,
        sink: &mut W,
        cancel: CancelToken,
    ) -> Result<RunSummary>
    where
        S: RowSource + Send + ?Sized,
        W: Write + Send + ?Sized,
    {
        // Task failures cancel this child, never the caller's token.
        let cancel = cancel.child();
        let cancel = match self.config.timeout {
            Some(timeout) => cancel.with_timeout(timeout),
            None => cancel,
        };
        self.state = RunState::Running;
        info!(
            mode = ?self.config.mode,
            capacity = self.config.capacity,
            "pipeline run started"
        );

        let started = Instant::now();
        let template = &self.config.template;
        let delimiter = self.config.delimiter;
        // Branch on the stream type once; each arm is monomorphic per item.
        let result = match self.config.mode {
            StreamMode::Records => self.supervise::<Record, _, _, _>(
                source,
                sink,
                &cancel,
                |rx, out| render_records(rx, template, out),
            ),
            StreamMode::Lines => self.supervise::<Line, _, _, _>(
                source,
                sink,
                &cancel,
                |rx, out| render_lines(rx, template, delimiter, out),
            ),
        };

        match &result {
            Ok(summary) => {
                self.state = RunState::Completed;
                info!(
                    rows = summary.rows_rendered,
                    high_water = summary.channel.high_water,
                    elapsed_ms = summary.elapsed.as_millis() as u64,
                    "pipeline run completed"
                );
            }
            Err(err) => {
                self.state = RunState::Failed;
                warn!(
                    error = %err,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "pipeline run failed"
                );
            }
        }
        result
    }

    fn supervise<T, S, W, R>(
        &self,
        source: &mut S,
        sink: &mut W,
        cancel: &CancelToken,
        render: R,
    ) -> Result<RunSummary>
    where
        T: RowPayload,
        S: RowSource + Send + ?Sized,
        W: Write + Send + ?Sized,
        R: FnOnce(StreamReceiver<T>, &mut W) -> Result<u64> + Send,
    {
        let started = Instant::now();
        let (tx, rx) = channel::bounded::<T>(self.config.capacity);
        let monitor = tx.monitor();
        let first_error = FirstError::new(cancel.clone());
        let delimiter = self.config.delimiter;

        let (produced, rendered) = thread::scope(|scope| {
            let errors = &first_error;
            let producer = scope.spawn(move || {
                produce(source, tx, cancel, delimiter).map_err(|err| errors.record("producer", err))
            });
            let renderer =
                scope.spawn(move || render(rx, sink).map_err(|err| errors.record("renderer", err)));
            (
                join_task(producer, "producer", errors),
                join_task(renderer, "renderer", errors),
            )
        });

        if let Some(err) = first_error.take() {
            return Err(err);
        }
        match (produced, rendered) {
            (Some(rows_produced), Some(rows_rendered)) => Ok(RunSummary {
                rows_produced,
                rows_rendered,
                channel: monitor.stats(),
                elapsed: started.elapsed(),
            }),
            // A task failed without leaving an error behind; cannot happen
            // while every failure path records one.
            _ => Err(PipelineError::StreamAborted),
        }
    }
}

fn join_task(
    handle: thread::ScopedJoinHandle<'_, std::result::Result<u64, ()>>,
    task: &'static str,
    errors: &FirstError,
) -> Option<u64> {
    match handle.join() {
        Ok(result) => result.ok(),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            errors.record(task, PipelineError::TaskPanicked { task, message });
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// First-error-wins slot shared by the tasks of one run.
///
/// An echo error (`StreamAborted`) is only kept until a primary error
/// arrives, since it merely reports that the other side already failed.
#[derive(Debug)]
struct FirstError {
    slot: Mutex<Option<PipelineError>>,
    cancel: CancelToken,
}

impl FirstError {
    fn new(cancel: CancelToken) -> Self {
        Self {
            slot: Mutex::new(None),
            cancel,
        }
    }

    /// Store `err` unless it is outranked, then cancel the run.
    ///
    /// The slot is filled before the token is set, so a `Cancelled` that the
    /// other task sees as a result of this call always arrives second.
    fn record(&self, task: &'static str, err: PipelineError) {
        {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            let replace = match slot.as_ref() {
                None => true,
                Some(existing) => existing.is_echo() && !err.is_echo(),
            };
            if replace {
                warn!(task, error = %err, "pipeline task failed");
                *slot = Some(err);
            }
        }
        self.cancel.cancel();
    }

    fn take(&self) -> Option<PipelineError> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
