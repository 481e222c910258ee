//! The notification center: one visible transient notice at a time.
//!
//! Showing a notice evicts whatever is currently displayed, renders the new
//! one, and schedules its expiry. The single-slot contract is deliberate:
//! there is no queue, the latest notice always wins immediately.

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Scheduler, Surface, TimerHandle};
use crate::domain::notification::{Notification, NotificationKind, DEFAULT_TTL};

use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

/// Error returned when building a NotificationCenter fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Default time to live must be greater than zero
    ZeroTtl,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::ZeroTtl => {
                write!(f, "default ttl must be greater than 0")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// Manages the single visible transient notice.
///
/// At most one notification is displayed at any time. [`show`] replaces the
/// current one immediately (its expiry timer is cancelled, so a displaced
/// notice can never clear its successor); [`dismiss`] removes it early; an
/// undisturbed notice removes itself when its time to live runs out.
///
/// Cloning is cheap and clones share the slot.
///
/// [`show`]: NotificationCenter::show
/// [`dismiss`]: NotificationCenter::dismiss
///
/// # Example
/// ```no_run
/// use damper::{NotificationCenter, NotificationKind, NullSurface};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let center = NotificationCenter::new(Arc::new(NullSurface::new()));
///
/// center.show("Could not reach the server", NotificationKind::Error);
/// // A newer notice replaces the old one immediately.
/// center.show("Saved", NotificationKind::Success);
///
/// assert_eq!(center.current().map(|n| n.message), Some("Saved".to_string()));
/// center.dismiss();
/// assert!(center.current().is_none());
/// # }
/// ```
pub struct NotificationCenter {
    inner: Arc<CenterInner>,
}

struct CenterInner {
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    surface: Arc<dyn Surface>,
    metrics: Metrics,
    default_ttl: Duration,
    slot: Mutex<Slot>,
}

/// The one display slot. The generation counter advances on every show and
/// dismiss; an expiry task fires only if its captured generation is still
/// current, so a displaced notice's timer is inert even if cancellation
/// races its fire.
struct Slot {
    current: Option<Notification>,
    generation: u64,
    timer: Option<Box<dyn TimerHandle>>,
}

impl Clone for NotificationCenter {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("default_ttl", &self.inner.default_ttl)
            .field("displaying", &self.current().is_some())
            .finish_non_exhaustive()
    }
}

impl NotificationCenter {
    /// Create a center rendering to `surface` with all other defaults.
    ///
    /// Equivalent to `NotificationCenter::builder().with_surface(surface)`
    /// followed by `build()`; uses the system clock, the Tokio scheduler,
    /// and a 5 second default time to live.
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        NotificationCenterBuilder::new()
            .with_surface(surface)
            .build()
            .expect("default configuration has a non-zero ttl")
    }

    /// Create a builder for configuring a notification center.
    pub fn builder() -> NotificationCenterBuilder {
        NotificationCenterBuilder::new()
    }

    /// Show a notice with the default time to live.
    ///
    /// Any currently displayed notice is evicted immediately, not queued
    /// behind. Returns a copy of what was displayed.
    pub fn show(&self, message: impl Into<String>, kind: NotificationKind) -> Notification {
        self.show_with_ttl(message, kind, self.inner.default_ttl)
    }

    /// Show a notice with an explicit time to live.
    pub fn show_with_ttl(
        &self,
        message: impl Into<String>,
        kind: NotificationKind,
        ttl: Duration,
    ) -> Notification {
        let notice = Notification::new(message, kind, self.inner.clock.now()).with_ttl(ttl);

        let replaced = {
            let mut slot = self.inner.lock_slot();
            let replaced = slot.current.is_some();

            // Silence the displaced notice's expiry before anything else:
            // cancel its timer and advance the generation its task checks.
            if let Some(timer) = slot.timer.take() {
                timer.cancel();
            }
            slot.generation += 1;
            let generation = slot.generation;

            slot.current = Some(notice.clone());
            let weak = Arc::downgrade(&self.inner);
            slot.timer = Some(
                self.inner
                    .scheduler
                    .schedule(ttl, Box::new(move || CenterInner::expire(&weak, generation))),
            );
            replaced
        };

        // Render outside the slot lock; the surface may call back in.
        self.inner.surface.render(&notice);

        self.inner.metrics.record_notice_shown();
        if replaced {
            self.inner.metrics.record_notice_replaced();
        }
        tracing::debug!(kind = notice.kind.as_str(), replaced, "notification shown");

        notice
    }

    /// Remove the currently displayed notice, if any.
    ///
    /// # Returns
    /// `true` if a notice was removed; `false` (a no-op) when nothing is
    /// displayed.
    pub fn dismiss(&self) -> bool {
        let dismissed = {
            let mut slot = self.inner.lock_slot();
            if slot.current.is_none() {
                return false;
            }
            if let Some(timer) = slot.timer.take() {
                timer.cancel();
            }
            slot.generation += 1;
            slot.current = None;
            true
        };

        self.inner.surface.clear();
        self.inner.metrics.record_notice_dismissed();
        tracing::debug!("notification dismissed");
        dismissed
    }

    /// The currently displayed notice, if any.
    pub fn current(&self) -> Option<Notification> {
        self.inner.lock_slot().current.clone()
    }

    /// The time to live applied by [`show`](NotificationCenter::show).
    pub fn default_ttl(&self) -> Duration {
        self.inner.default_ttl
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }
}

impl CenterInner {
    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot
            .lock()
            .expect("notification slot poisoned - no user code runs while it is held")
    }

    /// Expiry task for the notice shown at `generation`; a no-op when that
    /// notice was already replaced or dismissed, or the center is gone.
    fn expire(inner: &Weak<Self>, generation: u64) {
        let inner = match inner.upgrade() {
            Some(inner) => inner,
            None => return,
        };

        {
            let mut slot = inner.lock_slot();
            if slot.generation != generation || slot.current.is_none() {
                return;
            }
            slot.current = None;
            slot.timer = None;
        }

        inner.surface.clear();
        inner.metrics.record_notice_expired();
        tracing::debug!("notification expired");
    }
}

impl Drop for CenterInner {
    fn drop(&mut self) {
        if let Ok(slot) = self.slot.get_mut() {
            if let Some(timer) = slot.timer.take() {
                timer.cancel();
            }
        }
    }
}

/// Builder for constructing a [`NotificationCenter`].
///
/// Defaults: system clock, Tokio scheduler, null surface, a fresh metrics
/// registry, and a 5 second default time to live.
pub struct NotificationCenterBuilder {
    clock: Option<Arc<dyn Clock>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    surface: Option<Arc<dyn Surface>>,
    metrics: Option<Metrics>,
    default_ttl: Duration,
}

impl NotificationCenterBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self {
            clock: None,
            scheduler: None,
            surface: None,
            metrics: None,
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set a custom scheduler (mainly for testing).
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Set the surface notices are rendered to.
    pub fn with_surface(mut self, surface: Arc<dyn Surface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Share an existing metrics registry instead of creating a fresh one.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Set the time to live applied by [`NotificationCenter::show`].
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Build the notification center.
    ///
    /// # Errors
    /// Returns `BuildError::ZeroTtl` if the default time to live is zero.
    pub fn build(self) -> Result<NotificationCenter, BuildError> {
        if self.default_ttl.is_zero() {
            return Err(BuildError::ZeroTtl);
        }

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(crate::infrastructure::clock::SystemClock::new()));
        let metrics = self.metrics.unwrap_or_default();
        let scheduler = self.scheduler.unwrap_or_else(|| {
            Arc::new(
                crate::infrastructure::scheduler::TokioScheduler::new()
                    .with_metrics(metrics.clone()),
            )
        });
        let surface = self
            .surface
            .unwrap_or_else(|| Arc::new(crate::infrastructure::surface::NullSurface::new()));

        Ok(NotificationCenter {
            inner: Arc::new(CenterInner {
                clock,
                scheduler,
                surface,
                metrics,
                default_ttl: self.default_ttl,
                slot: Mutex::new(Slot {
                    current: None,
                    generation: 0,
                    timer: None,
                }),
            }),
        })
    }
}

impl Default for NotificationCenterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
