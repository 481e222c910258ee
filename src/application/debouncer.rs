//! Debounce wrapper: run a callback only after its calls stop arriving.
//!
//! Every call restarts the quiet period and replaces the pending payload, so
//! a burst of calls collapses into a single invocation with the payload of
//! the last call in the burst.

use crate::application::metrics::Metrics;
use crate::application::ports::{Scheduler, TimerHandle, TimerTask};
use crate::application::ConfigError;
use crate::domain::gate::DebounceGate;

use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

/// Defers a callback until `wait` has passed without another call.
///
/// Cloning is cheap and clones share state: a burst spread across clones is
/// still one burst. The callback receives the payload of the latest call.
///
/// # Example
/// ```no_run
/// use damper::debounce;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), damper::ConfigError> {
/// let on_input = debounce(Duration::from_millis(100), |query: String| {
///     println!("searching for {query}");
/// })?;
///
/// // Only "abc" is searched for, 100ms after the last keystroke.
/// on_input.call("a".to_string());
/// on_input.call("ab".to_string());
/// on_input.call("abc".to_string());
/// # Ok(())
/// # }
/// ```
pub struct Debouncer<T> {
    inner: Arc<DebounceInner<T>>,
}

struct DebounceInner<T> {
    callback: Box<dyn Fn(T) + Send + Sync>,
    scheduler: Arc<dyn Scheduler>,
    metrics: Metrics,
    state: Mutex<DebounceState<T>>,
}

struct DebounceState<T> {
    gate: DebounceGate,
    latest: Option<T>,
    timer: Option<Box<dyn TimerHandle>>,
}

impl<T> Clone for Debouncer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("wait", &self.wait())
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}

impl<T> Debouncer<T>
where
    T: Send + 'static,
{
    /// Create a new debouncer.
    ///
    /// # Arguments
    /// * `scheduler` - Timer facility the deferred fire runs on
    /// * `metrics` - Metrics registry (share one across components)
    /// * `wait` - Quiet period a call must survive before it fires
    /// * `callback` - Invoked with the latest payload once the burst ends
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroWait` if `wait` is zero.
    pub fn new<F>(
        scheduler: Arc<dyn Scheduler>,
        metrics: Metrics,
        wait: Duration,
        callback: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        if wait.is_zero() {
            return Err(ConfigError::ZeroWait);
        }
        Ok(Self {
            inner: Arc::new(DebounceInner {
                callback: Box::new(callback),
                scheduler,
                metrics,
                state: Mutex::new(DebounceState {
                    gate: DebounceGate::new(wait),
                    latest: None,
                    timer: None,
                }),
            }),
        })
    }

    /// Register a call, superseding any pending one.
    ///
    /// Stores `arg` as the pending payload and restarts the quiet period.
    /// The displaced timer is cancelled as an optimization; even if it slips
    /// past cancellation, the gate rejects its stale generation.
    pub fn call(&self, arg: T) {
        let superseded = {
            let mut state = self.inner.lock_state();
            let superseded = state.gate.is_armed();
            let generation = state.gate.on_call();
            state.latest = Some(arg);
            if let Some(timer) = state.timer.take() {
                timer.cancel();
            }

            let weak = Arc::downgrade(&self.inner);
            let task: TimerTask = Box::new(move || DebounceInner::fire(&weak, generation));
            let wait = state.gate.wait();
            state.timer = Some(self.inner.scheduler.schedule(wait, task));
            superseded
        };

        self.inner.metrics.record_debounce_scheduled();
        if superseded {
            self.inner.metrics.record_debounce_coalesced();
            tracing::trace!("debounced call superseded a pending fire");
        }
    }

    /// Discard the pending invocation, if any.
    ///
    /// # Returns
    /// `true` if a pending invocation was discarded.
    pub fn cancel(&self) -> bool {
        let mut state = self.inner.lock_state();
        let had_pending = state.gate.cancel();
        state.latest = None;
        if let Some(timer) = state.timer.take() {
            timer.cancel();
        }
        had_pending
    }

    /// Run the pending invocation now instead of waiting out the quiet period.
    ///
    /// # Returns
    /// `true` if a pending invocation ran.
    pub fn flush(&self) -> bool {
        let payload = {
            let mut state = self.inner.lock_state();
            if !state.gate.cancel() {
                return false;
            }
            if let Some(timer) = state.timer.take() {
                timer.cancel();
            }
            state.latest.take()
        };

        // Callback runs outside the lock so it may call back into this
        // debouncer.
        match payload {
            Some(arg) => {
                self.inner.metrics.record_debounce_fired();
                (self.inner.callback)(arg);
                true
            }
            None => false,
        }
    }

    /// Check whether an invocation is pending.
    pub fn is_pending(&self) -> bool {
        self.inner.lock_state().gate.is_armed()
    }

    /// The configured quiet period.
    pub fn wait(&self) -> Duration {
        self.inner.lock_state().gate.wait()
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }
}

impl<T> DebounceInner<T> {
    fn lock_state(&self) -> std::sync::MutexGuard<'_, DebounceState<T>> {
        self.state
            .lock()
            .expect("debounce state poisoned - no user code runs while it is held")
    }

    /// Deferred fire for `generation`; a no-op when superseded, flushed,
    /// cancelled, or when the debouncer is already gone.
    fn fire(inner: &Weak<Self>, generation: u64) {
        let inner = match inner.upgrade() {
            Some(inner) => inner,
            None => return,
        };

        let payload = {
            let mut state = inner.lock_state();
            if !state.gate.try_fire(generation) {
                return;
            }
            state.timer = None;
            state.latest.take()
        };

        if let Some(arg) = payload {
            inner.metrics.record_debounce_fired();
            tracing::trace!("debounced callback firing");
            (inner.callback)(arg);
        }
    }
}

impl<T> Drop for DebounceInner<T> {
    fn drop(&mut self) {
        // Release the timer promptly; the weak upgrade in fire() already
        // guarantees the callback can no longer run.
        if let Ok(state) = self.state.get_mut() {
            if let Some(timer) = state.timer.take() {
                timer.cancel();
            }
        }
    }
}

/// Debounce `callback` on the Tokio runtime with a fresh metrics registry.
///
/// Convenience wrapper over [`Debouncer::new`] using the
/// [`TokioScheduler`](crate::infrastructure::scheduler::TokioScheduler);
/// calls must happen within a Tokio runtime.
///
/// # Errors
/// Returns `ConfigError::ZeroWait` if `wait` is zero.
pub fn debounce<T, F>(wait: Duration, callback: F) -> Result<Debouncer<T>, ConfigError>
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    Debouncer::new(
        Arc::new(crate::infrastructure::scheduler::TokioScheduler::new()),
        Metrics::new(),
        wait,
        callback,
    )
}
