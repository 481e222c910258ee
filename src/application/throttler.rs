//! Throttle wrapper: run a callback at most once per window.
//!
//! The first call runs immediately and locks the wrapper for the configured
//! limit; calls arriving inside the window are dropped, not queued. This is
//! the leading-edge-only contract: there is no trailing invocation when the
//! window ends.

use crate::application::metrics::Metrics;
use crate::application::ports::Clock;
use crate::application::ConfigError;
use crate::domain::gate::{GateDecision, ThrottleGate};

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Runs a callback at most once per `limit`, dropping the rest.
///
/// Unlike [`Debouncer`](crate::application::debouncer::Debouncer), the
/// callback runs synchronously inside [`call`](Throttler::call), so a panic
/// in the callback propagates to the caller. The window is consumed either
/// way; a panicking run does not reopen the gate.
///
/// # Example
/// ```
/// use damper::throttle;
/// use std::time::Duration;
///
/// let on_scroll = throttle(Duration::from_millis(200), |position: u32| {
///     println!("repainting at {position}");
/// })?;
///
/// assert!(on_scroll.call(10).is_run());  // runs immediately
/// assert!(on_scroll.call(20).is_drop()); // inside the window: dropped
/// # Ok::<(), damper::ConfigError>(())
/// ```
pub struct Throttler<T> {
    inner: Arc<ThrottleInner<T>>,
}

struct ThrottleInner<T> {
    callback: Box<dyn Fn(T) + Send + Sync>,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
    gate: Mutex<ThrottleGate>,
}

impl<T> Clone for Throttler<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> fmt::Debug for Throttler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttler")
            .field("limit", &self.limit())
            .finish_non_exhaustive()
    }
}

impl<T> Throttler<T>
where
    T: 'static,
{
    /// Create a new throttler.
    ///
    /// # Arguments
    /// * `clock` - Time source consulted on every call
    /// * `metrics` - Metrics registry (share one across components)
    /// * `limit` - Minimum spacing between two runs
    /// * `callback` - Invoked synchronously for each call that runs
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroLimit` if `limit` is zero.
    pub fn new<F>(
        clock: Arc<dyn Clock>,
        metrics: Metrics,
        limit: Duration,
        callback: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        if limit.is_zero() {
            return Err(ConfigError::ZeroLimit);
        }
        Ok(Self {
            inner: Arc::new(ThrottleInner {
                callback: Box::new(callback),
                clock,
                metrics,
                gate: Mutex::new(ThrottleGate::new(limit)),
            }),
        })
    }

    /// Register a call; run the callback if the gate is open.
    ///
    /// A `Run` decision invokes the callback before returning. A `Drop`
    /// decision discards `arg` entirely.
    pub fn call(&self, arg: T) -> GateDecision {
        let now = self.inner.clock.now();
        let decision = self.inner.lock_gate().on_call(now);

        // Callback runs outside the gate lock so it may call back into this
        // throttler (and so a propagating panic cannot poison the gate).
        match decision {
            GateDecision::Run => {
                self.inner.metrics.record_throttle_invoked();
                (self.inner.callback)(arg);
            }
            GateDecision::Drop => {
                self.inner.metrics.record_throttle_dropped();
                tracing::trace!("throttled call dropped inside window");
            }
        }

        decision
    }

    /// Unlock the gate immediately; the next call runs.
    pub fn reset(&self) {
        self.inner.lock_gate().reset();
    }

    /// Check whether the gate is currently locked.
    pub fn is_locked(&self) -> bool {
        let now = self.inner.clock.now();
        self.inner.lock_gate().is_locked(now)
    }

    /// The configured minimum spacing between runs.
    pub fn limit(&self) -> Duration {
        self.inner.lock_gate().limit()
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }
}

impl<T> ThrottleInner<T> {
    fn lock_gate(&self) -> std::sync::MutexGuard<'_, ThrottleGate> {
        self.gate
            .lock()
            .expect("throttle gate poisoned - no user code runs while it is held")
    }
}

/// Throttle `callback` against the system clock with a fresh metrics registry.
///
/// Convenience wrapper over [`Throttler::new`] using the
/// [`SystemClock`](crate::infrastructure::clock::SystemClock).
///
/// # Errors
/// Returns `ConfigError::ZeroLimit` if `limit` is zero.
pub fn throttle<T, F>(limit: Duration, callback: F) -> Result<Throttler<T>, ConfigError>
where
    T: 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    Throttler::new(
        Arc::new(crate::infrastructure::clock::SystemClock::new()),
        Metrics::new(),
        limit,
        callback,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockClock;
    use std::sync::Mutex;
    use std::time::Instant;

    fn recording_throttler(
        clock: &MockClock,
        limit: Duration,
    ) -> (Throttler<u32>, Arc<Mutex<Vec<u32>>>) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        let throttler = Throttler::new(
            Arc::new(clock.clone()),
            Metrics::new(),
            limit,
            move |arg: u32| sink.lock().unwrap().push(arg),
        )
        .unwrap();
        (throttler, fired)
    }

    #[test]
    fn test_zero_limit_rejected() {
        let clock = MockClock::new(Instant::now());
        let result = Throttler::new(
            Arc::new(clock),
            Metrics::new(),
            Duration::ZERO,
            |_: u32| {},
        );
        assert_eq!(result.err(), Some(ConfigError::ZeroLimit));
    }

    #[test]
    fn test_first_call_runs_window_drops() {
        let clock = MockClock::new(Instant::now());
        let (throttler, fired) = recording_throttler(&clock, Duration::from_millis(200));

        // Calls at t=0, t=50, t=250: the middle one lands inside the window.
        assert_eq!(throttler.call(1), GateDecision::Run);
        clock.advance(Duration::from_millis(50));
        assert_eq!(throttler.call(2), GateDecision::Drop);
        clock.advance(Duration::from_millis(200));
        assert_eq!(throttler.call(3), GateDecision::Run);

        assert_eq!(*fired.lock().unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_call_at_exact_window_end_runs() {
        let clock = MockClock::new(Instant::now());
        let (throttler, fired) = recording_throttler(&clock, Duration::from_millis(100));

        assert!(throttler.call(1).is_run());
        clock.advance(Duration::from_millis(100));
        assert!(throttler.call(2).is_run());

        assert_eq!(*fired.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_dropped_payloads_are_not_queued() {
        let clock = MockClock::new(Instant::now());
        let (throttler, fired) = recording_throttler(&clock, Duration::from_millis(100));

        throttler.call(1);
        throttler.call(2);
        throttler.call(3);

        // Only the first ran; the window ending does not replay 2 or 3.
        clock.advance(Duration::from_millis(150));
        assert_eq!(*fired.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_reset_unlocks() {
        let clock = MockClock::new(Instant::now());
        let (throttler, fired) = recording_throttler(&clock, Duration::from_secs(60));

        assert!(throttler.call(1).is_run());
        assert!(throttler.call(2).is_drop());
        assert!(throttler.is_locked());

        throttler.reset();
        assert!(!throttler.is_locked());
        assert!(throttler.call(3).is_run());

        assert_eq!(*fired.lock().unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_metrics_counts() {
        let clock = MockClock::new(Instant::now());
        let (throttler, _fired) = recording_throttler(&clock, Duration::from_millis(100));

        throttler.call(1);
        throttler.call(2);
        throttler.call(3);
        throttler.call(4);

        let snapshot = throttler.metrics().snapshot();
        assert_eq!(snapshot.throttle_invoked, 1);
        assert_eq!(snapshot.throttle_dropped, 3);
        assert_eq!(snapshot.throttle_total(), 4);
        assert!((snapshot.throttle_drop_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_callback_panic_propagates_and_window_stays_consumed() {
        let clock = MockClock::new(Instant::now());
        let throttler = Throttler::new(
            Arc::new(clock.clone()),
            Metrics::new(),
            Duration::from_millis(100),
            |_: u32| panic!("boom"),
        )
        .unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            throttler.call(1);
        }));
        assert!(result.is_err(), "panic must reach the caller");

        // The run consumed the window even though it panicked.
        assert!(throttler.is_locked());
        assert!(throttler.call(2).is_drop());
    }

    #[test]
    fn test_clones_share_the_window() {
        let clock = MockClock::new(Instant::now());
        let (throttler, fired) = recording_throttler(&clock, Duration::from_millis(100));

        let clone = throttler.clone();
        assert!(throttler.call(1).is_run());
        assert!(clone.call(2).is_drop());

        assert_eq!(*fired.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_limit_accessor() {
        let clock = MockClock::new(Instant::now());
        let (throttler, _) = recording_throttler(&clock, Duration::from_millis(300));
        assert_eq!(throttler.limit(), Duration::from_millis(300));
    }
}
