//! Observability metrics for gating and notifications.
//!
//! Provides counters about debounce, throttle, and notification behavior for
//! monitoring and debugging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking gating and notification statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Cloning is cheap and clones share state, so one registry can be threaded
/// through every component of an application and queried at any time.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Debounced calls accepted (each schedules or reschedules a fire)
    debounce_scheduled: AtomicU64,
    /// Debounced calls that superseded an already pending fire
    debounce_coalesced: AtomicU64,
    /// Debounced callbacks actually invoked
    debounce_fired: AtomicU64,
    /// Throttled calls that ran the callback
    throttle_invoked: AtomicU64,
    /// Throttled calls dropped inside a locked window
    throttle_dropped: AtomicU64,
    /// Notifications shown
    notices_shown: AtomicU64,
    /// Notifications displaced early by a newer one
    notices_replaced: AtomicU64,
    /// Notifications dismissed explicitly
    notices_dismissed: AtomicU64,
    /// Notifications that reached their time to live
    notices_expired: AtomicU64,
    /// Panics caught at the scheduler boundary
    callback_panics: AtomicU64,
    /// Keys evicted from bounded keyed gates
    keys_evicted: AtomicU64,
}

impl Metrics {
    /// Create a new metrics registry with all counters at zero.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                debounce_scheduled: AtomicU64::new(0),
                debounce_coalesced: AtomicU64::new(0),
                debounce_fired: AtomicU64::new(0),
                throttle_invoked: AtomicU64::new(0),
                throttle_dropped: AtomicU64::new(0),
                notices_shown: AtomicU64::new(0),
                notices_replaced: AtomicU64::new(0),
                notices_dismissed: AtomicU64::new(0),
                notices_expired: AtomicU64::new(0),
                callback_panics: AtomicU64::new(0),
                keys_evicted: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_debounce_scheduled(&self) {
        self.inner.debounce_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_debounce_coalesced(&self) {
        self.inner.debounce_coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_debounce_fired(&self) {
        self.inner.debounce_fired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_throttle_invoked(&self) {
        self.inner.throttle_invoked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_throttle_dropped(&self) {
        self.inner.throttle_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_notice_shown(&self) {
        self.inner.notices_shown.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_notice_replaced(&self) {
        self.inner.notices_replaced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_notice_dismissed(&self) {
        self.inner.notices_dismissed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_notice_expired(&self) {
        self.inner.notices_expired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_callback_panic(&self) {
        self.inner.callback_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_key_evicted(&self) {
        self.inner.keys_evicted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            debounce_scheduled: self.inner.debounce_scheduled.load(Ordering::Relaxed),
            debounce_coalesced: self.inner.debounce_coalesced.load(Ordering::Relaxed),
            debounce_fired: self.inner.debounce_fired.load(Ordering::Relaxed),
            throttle_invoked: self.inner.throttle_invoked.load(Ordering::Relaxed),
            throttle_dropped: self.inner.throttle_dropped.load(Ordering::Relaxed),
            notices_shown: self.inner.notices_shown.load(Ordering::Relaxed),
            notices_replaced: self.inner.notices_replaced.load(Ordering::Relaxed),
            notices_dismissed: self.inner.notices_dismissed.load(Ordering::Relaxed),
            notices_expired: self.inner.notices_expired.load(Ordering::Relaxed),
            callback_panics: self.inner.callback_panics.load(Ordering::Relaxed),
            keys_evicted: self.inner.keys_evicted.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    ///
    /// Useful for testing or when starting a new monitoring period.
    pub fn reset(&self) {
        self.inner.debounce_scheduled.store(0, Ordering::Relaxed);
        self.inner.debounce_coalesced.store(0, Ordering::Relaxed);
        self.inner.debounce_fired.store(0, Ordering::Relaxed);
        self.inner.throttle_invoked.store(0, Ordering::Relaxed);
        self.inner.throttle_dropped.store(0, Ordering::Relaxed);
        self.inner.notices_shown.store(0, Ordering::Relaxed);
        self.inner.notices_replaced.store(0, Ordering::Relaxed);
        self.inner.notices_dismissed.store(0, Ordering::Relaxed);
        self.inner.notices_expired.store(0, Ordering::Relaxed);
        self.inner.callback_panics.store(0, Ordering::Relaxed);
        self.inner.keys_evicted.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Debounced calls accepted (each schedules or reschedules a fire)
    pub debounce_scheduled: u64,
    /// Debounced calls that superseded an already pending fire
    pub debounce_coalesced: u64,
    /// Debounced callbacks actually invoked
    pub debounce_fired: u64,
    /// Throttled calls that ran the callback
    pub throttle_invoked: u64,
    /// Throttled calls dropped inside a locked window
    pub throttle_dropped: u64,
    /// Notifications shown
    pub notices_shown: u64,
    /// Notifications displaced early by a newer one
    pub notices_replaced: u64,
    /// Notifications dismissed explicitly
    pub notices_dismissed: u64,
    /// Notifications that reached their time to live
    pub notices_expired: u64,
    /// Panics caught at the scheduler boundary
    pub callback_panics: u64,
    /// Keys evicted from bounded keyed gates
    pub keys_evicted: u64,
}

impl MetricsSnapshot {
    /// Total throttled calls observed (invoked + dropped).
    pub fn throttle_total(&self) -> u64 {
        self.throttle_invoked.saturating_add(self.throttle_dropped)
    }

    /// Ratio of throttled calls that were dropped (0.0 to 1.0).
    ///
    /// Returns 0.0 if no throttled calls have been observed.
    pub fn throttle_drop_rate(&self) -> f64 {
        let total = self.throttle_total();
        if total == 0 {
            0.0
        } else {
            self.throttle_dropped as f64 / total as f64
        }
    }

    /// Ratio of debounced calls that were coalesced away (0.0 to 1.0).
    ///
    /// Returns 0.0 if no debounced calls have been observed.
    pub fn debounce_coalesce_rate(&self) -> f64 {
        if self.debounce_scheduled == 0 {
            0.0
        } else {
            self.debounce_coalesced as f64 / self.debounce_scheduled as f64
        }
    }
}
