//! Scheduler adapter for deferred execution on the Tokio runtime.
//!
//! Provides TokioScheduler, the production implementation of the
//! [`Scheduler`](crate::application::ports::Scheduler) port.
//!
//! # Testing
//!
//! See `MockScheduler` (in `crate::infrastructure::mocks`) for a controllable
//! scheduler that fires timers on manually advanced time. Available with the
//! `test-helpers` feature or in test builds.

use crate::application::metrics::Metrics;
use crate::application::ports::{Scheduler, TimerHandle, TimerTask};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

/// Scheduler implementation backed by `tokio::spawn` and `tokio::time::sleep`.
///
/// Each scheduled task becomes a single spawned Tokio task that sleeps for
/// the delay and then runs the closure. Cancellation aborts the spawned task;
/// it is best effort, as the task may already be past its sleep.
///
/// # Panics
///
/// `schedule` must be called within a Tokio runtime; outside one,
/// `tokio::spawn` panics.
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler {
    metrics: Option<Metrics>,
}

impl TokioScheduler {
    /// Create a new Tokio-backed scheduler.
    pub fn new() -> Self {
        Self { metrics: None }
    }

    /// Attach a metrics registry so contained panics are counted.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> Box<dyn TimerHandle> {
        let metrics = self.metrics.clone();
        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            run_contained(task, metrics.as_ref());
        });
        Box::new(TokioTimerHandle {
            abort: join.abort_handle(),
        })
    }
}

/// Handle to a task spawned by [`TokioScheduler`].
#[derive(Debug)]
struct TokioTimerHandle {
    abort: tokio::task::AbortHandle,
}

impl TimerHandle for TokioTimerHandle {
    fn cancel(&self) {
        self.abort.abort();
    }
}

/// Run a timer task with panic containment.
///
/// A panicking task is caught here, logged, and counted; it never unwinds
/// into the runtime or disturbs other scheduled tasks.
pub(crate) fn run_contained(task: TimerTask, metrics: Option<&Metrics>) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
        tracing::error!(
            panic = panic_message(payload.as_ref()),
            "scheduled callback panicked; contained at the scheduler boundary"
        );
        if let Some(metrics) = metrics {
            metrics.record_callback_panic();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}
