//! Per-key gating: an independent debounce or throttle gate per entity.
//!
//! Where [`Debouncer`](crate::application::debouncer::Debouncer) and
//! [`Throttler`](crate::application::throttler::Throttler) gate one callback
//! globally, the keyed variants keep a separate gate per key (per input
//! field, per event source) in a concurrent map, so bursts on one key never
//! affect another. The map can be bounded; when full, the least recently
//! used key is evicted to make room.

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Scheduler, TimerHandle, TimerTask};
use crate::application::ConfigError;
use crate::domain::gate::{DebounceGate, GateDecision, ThrottleGate};

use ahash::RandomState;
use dashmap::DashMap;

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Debounces calls independently per key.
///
/// Each key carries its own quiet period and pending payload; the callback
/// receives the key together with the latest payload once that key's burst
/// ends.
///
/// # Example
/// ```no_run
/// use damper::KeyedDebouncer;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), damper::ConfigError> {
/// let validator = KeyedDebouncer::new(
///     Arc::new(damper::TokioScheduler::new()),
///     damper::Metrics::new(),
///     Duration::from_millis(300),
///     |field: String, value: String| println!("validating {field}={value}"),
/// )?;
///
/// // Bursts on different fields settle independently.
/// validator.call("email".to_string(), "a@".to_string());
/// validator.call("phone".to_string(), "+998".to_string());
/// validator.call("email".to_string(), "a@b.co".to_string());
/// # Ok(())
/// # }
/// ```
pub struct KeyedDebouncer<K, T> {
    scheduler: Arc<dyn Scheduler>,
    wait: Duration,
    max_keys: Option<usize>,
    inner: Arc<KeyedDebounceInner<K, T>>,
}

struct KeyedDebounceInner<K, T> {
    callback: Box<dyn Fn(K, T) + Send + Sync>,
    metrics: Metrics,
    stamp: AtomicU64,
    entries: DashMap<K, DebounceEntry<T>, RandomState>,
}

struct DebounceEntry<T> {
    gate: DebounceGate,
    latest: Option<T>,
    timer: Option<Box<dyn TimerHandle>>,
    last_use: u64,
}

impl<K, T> Clone for KeyedDebouncer<K, T> {
    fn clone(&self) -> Self {
        Self {
            scheduler: Arc::clone(&self.scheduler),
            wait: self.wait,
            max_keys: self.max_keys,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Eq + Hash, T> fmt::Debug for KeyedDebouncer<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedDebouncer")
            .field("wait", &self.wait)
            .field("max_keys", &self.max_keys)
            .field("keys", &self.inner.entries.len())
            .finish_non_exhaustive()
    }
}

impl<K, T> KeyedDebouncer<K, T>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    /// Create a new keyed debouncer with an unbounded key map.
    ///
    /// # Arguments
    /// * `scheduler` - Timer facility the deferred fires run on
    /// * `metrics` - Metrics registry (share one across components)
    /// * `wait` - Quiet period a call must survive before it fires
    /// * `callback` - Invoked with the key and its latest payload
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
        F: Fn(K, T) + Send + Sync + 'static,
    {
        if wait.is_zero() {
            return Err(ConfigError::ZeroWait);
        }
        Ok(Self {
            scheduler,
            wait,
            max_keys: None,
            inner: Arc::new(KeyedDebounceInner {
                callback: Box::new(callback),
                metrics,
                stamp: AtomicU64::new(0),
                entries: DashMap::with_hasher(RandomState::new()),
            }),
        })
    }

    /// Bound the key map to at most `max_keys` entries.
    ///
    /// When a call would exceed the bound, the least recently used key is
    /// evicted first; an evicted key's pending fire is discarded.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroMaxKeys` if `max_keys` is zero.
    pub fn with_max_keys(mut self, max_keys: usize) -> Result<Self, ConfigError> {
        if max_keys == 0 {
            return Err(ConfigError::ZeroMaxKeys);
        }
        self.max_keys = Some(max_keys);
        Ok(self)
    }

    /// Register a call for `key`, superseding any pending one on that key.
    pub fn call(&self, key: K, arg: T) {
        if let Some(max_keys) = self.max_keys {
            self.evict_if_full(max_keys, &key);
        }

        let wait = self.wait;
        let superseded = {
            let mut entry = self
                .inner
                .entries
                .entry(key.clone())
                .or_insert_with(|| DebounceEntry {
                    gate: DebounceGate::new(wait),
                    latest: None,
                    timer: None,
                    last_use: 0,
                });

            let superseded = entry.gate.is_armed();
            let generation = entry.gate.on_call();
            entry.latest = Some(arg);
            entry.last_use = self.inner.stamp.fetch_add(1, Ordering::Relaxed);
            if let Some(timer) = entry.timer.take() {
                timer.cancel();
            }

            let weak = Arc::downgrade(&self.inner);
            let timer_key = key;
            let task: TimerTask =
                Box::new(move || KeyedDebounceInner::fire(&weak, timer_key, generation));
            entry.timer = Some(self.scheduler.schedule(wait, task));
            superseded
        };

        self.inner.metrics.record_debounce_scheduled();
        if superseded {
            self.inner.metrics.record_debounce_coalesced();
        }
    }

    /// Discard the pending invocation for `key`, if any.
    ///
    /// # Returns
    /// `true` if a pending invocation was discarded.
    pub fn cancel(&self, key: &K) -> bool {
        match self.inner.entries.get_mut(key) {
            Some(mut entry) => {
                let had_pending = entry.gate.cancel();
                entry.latest = None;
                if let Some(timer) = entry.timer.take() {
                    timer.cancel();
                }
                had_pending
            }
            None => false,
        }
    }

    /// Forget `key` entirely, discarding any pending invocation.
    ///
    /// # Returns
    /// `true` if the key was tracked.
    pub fn remove(&self, key: &K) -> bool {
        match self.inner.entries.remove(key) {
            Some((_, mut entry)) => {
                if let Some(timer) = entry.timer.take() {
                    timer.cancel();
                }
                true
            }
            None => false,
        }
    }

    /// Check whether an invocation is pending for `key`.
    pub fn is_pending(&self, key: &K) -> bool {
        self.inner
            .entries
            .get(key)
            .map_or(false, |entry| entry.gate.is_armed())
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Check if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// The configured quiet period.
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    /// Evict the least recently used key to make room for `incoming`.
    fn evict_if_full(&self, max_keys: usize, incoming: &K) {
        if self.inner.entries.len() < max_keys || self.inner.entries.contains_key(incoming) {
            return;
        }

        let victim = self
            .inner
            .entries
            .iter()
            .min_by_key(|entry| entry.value().last_use)
            .map(|entry| entry.key().clone());

        if let Some(victim) = victim {
            if let Some((_, mut entry)) = self.inner.entries.remove(&victim) {
                if let Some(timer) = entry.timer.take() {
                    timer.cancel();
                }
                self.inner.metrics.record_key_evicted();
                tracing::debug!("evicted least recently used debounce key");
            }
        }
    }
}

impl<K, T> KeyedDebounceInner<K, T>
where
    K: Clone + Eq + Hash,
{
    /// Deferred fire for `key` at `generation`; a no-op when superseded,
    /// cancelled, evicted, or when the debouncer is already gone.
    fn fire(inner: &Weak<Self>, key: K, generation: u64) {
        let inner = match inner.upgrade() {
            Some(inner) => inner,
            None => return,
        };

        let payload = {
            let mut entry = match inner.entries.get_mut(&key) {
                Some(entry) => entry,
                None => return,
            };
            if !entry.gate.try_fire(generation) {
                return;
            }
            entry.timer = None;
            entry.latest.take()
        };

        if let Some(arg) = payload {
            inner.metrics.record_debounce_fired();
            (inner.callback)(key, arg);
        }
    }
}

/// Throttles calls independently per key.
///
/// Each key carries its own lock window; the first call on an idle key runs
/// immediately and locks only that key.
///
/// # Example
/// ```
/// use damper::{KeyedThrottler, Metrics, SystemClock};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let tracker = KeyedThrottler::new(
///     Arc::new(SystemClock::new()),
///     Metrics::new(),
///     Duration::from_millis(200),
///     |source: &&str, position: u32| println!("{source} at {position}"),
/// )?;
///
/// assert!(tracker.call("scroll", 10).is_run());
/// assert!(tracker.call("scroll", 20).is_drop()); // scroll is locked
/// assert!(tracker.call("resize", 30).is_run()); // resize is independent
/// # Ok::<(), damper::ConfigError>(())
/// ```
pub struct KeyedThrottler<K, T> {
    clock: Arc<dyn Clock>,
    limit: Duration,
    max_keys: Option<usize>,
    inner: Arc<KeyedThrottleInner<K, T>>,
}

struct KeyedThrottleInner<K, T> {
    callback: Box<dyn Fn(&K, T) + Send + Sync>,
    metrics: Metrics,
    stamp: AtomicU64,
    entries: DashMap<K, ThrottleEntry, RandomState>,
}

struct ThrottleEntry {
    gate: ThrottleGate,
    last_use: u64,
}

impl<K, T> Clone for KeyedThrottler<K, T> {
    fn clone(&self) -> Self {
        Self {
            clock: Arc::clone(&self.clock),
            limit: self.limit,
            max_keys: self.max_keys,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Eq + Hash, T> fmt::Debug for KeyedThrottler<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedThrottler")
            .field("limit", &self.limit)
            .field("max_keys", &self.max_keys)
            .field("keys", &self.inner.entries.len())
            .finish_non_exhaustive()
    }
}

impl<K, T> KeyedThrottler<K, T>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    T: 'static,
{
    /// Create a new keyed throttler with an unbounded key map.
    ///
    /// # Arguments
    /// * `clock` - Time source consulted on every call
    /// * `metrics` - Metrics registry (share one across components)
    /// * `limit` - Minimum spacing between two runs on the same key
    /// * `callback` - Invoked synchronously with the key for each call that runs
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
        F: Fn(&K, T) + Send + Sync + 'static,
    {
        if limit.is_zero() {
            return Err(ConfigError::ZeroLimit);
        }
        Ok(Self {
            clock,
            limit,
            max_keys: None,
            inner: Arc::new(KeyedThrottleInner {
                callback: Box::new(callback),
                metrics,
                stamp: AtomicU64::new(0),
                entries: DashMap::with_hasher(RandomState::new()),
            }),
        })
    }

    /// Bound the key map to at most `max_keys` entries.
    ///
    /// When a call would exceed the bound, the least recently used key is
    /// evicted first.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroMaxKeys` if `max_keys` is zero.
    pub fn with_max_keys(mut self, max_keys: usize) -> Result<Self, ConfigError> {
        if max_keys == 0 {
            return Err(ConfigError::ZeroMaxKeys);
        }
        self.max_keys = Some(max_keys);
        Ok(self)
    }

    /// Register a call for `key`; run the callback if that key's gate is open.
    ///
    /// A `Run` decision invokes the callback before returning. As with
    /// [`Throttler::call`](crate::application::throttler::Throttler::call),
    /// a panicking callback propagates to the caller and the key's window
    /// stays consumed.
    pub fn call(&self, key: K, arg: T) -> GateDecision {
        if let Some(max_keys) = self.max_keys {
            self.evict_if_full(max_keys, &key);
        }

        let now = self.clock.now();
        let limit = self.limit;
        let decision = {
            let mut entry = self
                .inner
                .entries
                .entry(key.clone())
                .or_insert_with(|| ThrottleEntry {
                    gate: ThrottleGate::new(limit),
                    last_use: 0,
                });
            entry.last_use = self.inner.stamp.fetch_add(1, Ordering::Relaxed);
            entry.gate.on_call(now)
        };

        // Callback runs outside the map entry lock so it may call back into
        // this throttler.
        match decision {
            GateDecision::Run => {
                self.inner.metrics.record_throttle_invoked();
                (self.inner.callback)(&key, arg);
            }
            GateDecision::Drop => {
                self.inner.metrics.record_throttle_dropped();
            }
        }

        decision
    }

    /// Unlock the gate for `key` immediately.
    ///
    /// # Returns
    /// `true` if the key was tracked.
    pub fn reset(&self, key: &K) -> bool {
        match self.inner.entries.get_mut(key) {
            Some(mut entry) => {
                entry.gate.reset();
                true
            }
            None => false,
        }
    }

    /// Forget `key` entirely; its next call runs immediately.
    ///
    /// # Returns
    /// `true` if the key was tracked.
    pub fn remove(&self, key: &K) -> bool {
        self.inner.entries.remove(key).is_some()
    }

    /// Check whether the gate for `key` is currently locked.
    pub fn is_locked(&self, key: &K) -> bool {
        let now = self.clock.now();
        self.inner
            .entries
            .get(key)
            .map_or(false, |entry| entry.gate.is_locked(now))
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Check if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// The configured minimum spacing between runs on one key.
    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    /// Evict the least recently used key to make room for `incoming`.
    fn evict_if_full(&self, max_keys: usize, incoming: &K) {
        if self.inner.entries.len() < max_keys || self.inner.entries.contains_key(incoming) {
            return;
        }

        let victim = self
            .inner
            .entries
            .iter()
            .min_by_key(|entry| entry.value().last_use)
            .map(|entry| entry.key().clone());

        if let Some(victim) = victim {
            if self.inner.entries.remove(&victim).is_some() {
                self.inner.metrics.record_key_evicted();
                tracing::debug!("evicted least recently used throttle key");
            }
        }
    }
}
