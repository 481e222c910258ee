//! Call gating state machines for debounce and throttle.
//!
//! This module defines the pure decision logic behind the wrappers in the
//! application layer. Gates know nothing about timers or callbacks; they are
//! driven entirely by caller-supplied `Instant`s and generation tokens, which
//! keeps every timing rule testable without waiting on real time.

use std::time::{Duration, Instant};

/// Decision made by a gate for a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Run the callback for this call
    Run,
    /// Drop this call (the callback never runs for it)
    Drop,
}

impl GateDecision {
    /// Check if this decision is Run.
    pub fn is_run(&self) -> bool {
        matches!(self, GateDecision::Run)
    }

    /// Check if this decision is Drop.
    pub fn is_drop(&self) -> bool {
        matches!(self, GateDecision::Drop)
    }
}

/// Throttle gate: the first call runs and locks the gate.
///
/// A call arriving while the gate is locked is dropped, not queued; there is
/// no trailing invocation when the lock ends. A call arriving at exactly the
/// unlock instant runs.
///
/// # Example
/// ```
/// use damper::{GateDecision, ThrottleGate};
/// use std::time::{Duration, Instant};
///
/// let mut gate = ThrottleGate::new(Duration::from_millis(200));
/// let start = Instant::now();
///
/// // First call runs and locks the gate for 200ms
/// assert!(gate.on_call(start).is_run());
///
/// // Calls inside the window are dropped
/// assert!(gate.on_call(start + Duration::from_millis(50)).is_drop());
///
/// // Once the window has passed, the next call runs again
/// assert!(gate.on_call(start + Duration::from_millis(250)).is_run());
/// ```
#[derive(Debug, Clone)]
pub struct ThrottleGate {
    limit: Duration,
    locked_until: Option<Instant>,
}

impl ThrottleGate {
    /// Create a new throttle gate.
    ///
    /// # Arguments
    /// * `limit` - Minimum spacing between two runs
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            locked_until: None,
        }
    }

    /// Register a call at `now` and decide whether it runs.
    ///
    /// A `Run` decision locks the gate until `now + limit`.
    pub fn on_call(&mut self, now: Instant) -> GateDecision {
        match self.locked_until {
            Some(until) if now < until => GateDecision::Drop,
            _ => {
                self.locked_until = Some(now + self.limit);
                GateDecision::Run
            }
        }
    }

    /// Check whether the gate is locked at `now`.
    pub fn is_locked(&self, now: Instant) -> bool {
        matches!(self.locked_until, Some(until) if now < until)
    }

    /// Unlock the gate immediately; the next call runs.
    pub fn reset(&mut self) {
        self.locked_until = None;
    }

    /// The configured minimum spacing between runs.
    pub fn limit(&self) -> Duration {
        self.limit
    }
}

/// Debounce gate: every call supersedes the calls before it.
///
/// The gate hands out a fresh generation token per call. A deferred fire is
/// valid only if it presents the token of the *latest* call, so cancelling
/// the underlying timer is an optimization rather than a correctness
/// requirement: a superseded timer that slips past cancellation is rejected
/// here and never reaches the callback.
///
/// # Example
/// ```
/// use damper::DebounceGate;
/// use std::time::Duration;
///
/// let mut gate = DebounceGate::new(Duration::from_millis(100));
///
/// let first = gate.on_call();
/// let second = gate.on_call(); // supersedes `first`
///
/// assert!(!gate.try_fire(first)); // stale timer: rejected
/// assert!(gate.try_fire(second)); // latest timer: fires
/// assert!(!gate.try_fire(second)); // already fired
/// ```
#[derive(Debug, Clone)]
pub struct DebounceGate {
    wait: Duration,
    generation: u64,
    armed: bool,
}

impl DebounceGate {
    /// Create a new debounce gate.
    ///
    /// # Arguments
    /// * `wait` - Quiet period a call must survive before it fires
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            generation: 0,
            armed: false,
        }
    }

    /// Register a call, superseding any pending one.
    ///
    /// # Returns
    /// The generation token the matching deferred fire must present.
    pub fn on_call(&mut self) -> u64 {
        self.generation += 1;
        self.armed = true;
        self.generation
    }

    /// Attempt a deferred fire for `generation`.
    ///
    /// # Returns
    /// `true` (and disarms the gate) only if the gate is armed and
    /// `generation` is the latest; stale and repeated fires return `false`.
    pub fn try_fire(&mut self, generation: u64) -> bool {
        if self.armed && generation == self.generation {
            self.armed = false;
            true
        } else {
            false
        }
    }

    /// Discard any pending fire without running it.
    ///
    /// # Returns
    /// `true` if a pending fire was discarded.
    pub fn cancel(&mut self) -> bool {
        let was_armed = self.armed;
        self.armed = false;
        was_armed
    }

    /// Check whether a fire is pending.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// The configured quiet period.
    pub fn wait(&self) -> Duration {
        self.wait
    }
}
