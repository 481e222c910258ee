//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use std::fmt::Debug;
use std::time::{Duration, Instant};

use crate::domain::notification::Notification;

/// Port for obtaining current time.
///
/// This abstraction allows the application layer to work with time
/// without depending on system clock implementation details.
/// Infrastructure provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// A deferred unit of work handed to a [`Scheduler`].
pub type TimerTask = Box<dyn FnOnce() + Send>;

/// Port for single-shot deferred execution.
///
/// This abstraction allows the application layer to arrange "run this once,
/// later" without depending on a concrete timer implementation.
/// Infrastructure provides concrete implementations (TokioScheduler,
/// MockScheduler).
///
/// # Contract
/// * The task runs at most once, no earlier than `delay` after `schedule`.
/// * A panicking task is contained at the scheduler boundary: caught, logged,
///   counted, and never allowed to disturb other scheduled tasks.
/// * Cancellation through the returned handle is best effort; a task may
///   already be mid-flight when `cancel` is called. Callers that need
///   exactly-once semantics must pair the handle with a staleness guard
///   (see `DebounceGate::try_fire`), which is how every caller in this crate
///   uses it.
pub trait Scheduler: Send + Sync + Debug {
    /// Schedule `task` to run once after `delay`.
    ///
    /// # Returns
    /// A handle that can be used to request cancellation.
    fn schedule(&self, delay: Duration, task: TimerTask) -> Box<dyn TimerHandle>;
}

/// Handle to a scheduled task.
pub trait TimerHandle: Send + Sync + Debug {
    /// Request cancellation of the scheduled task.
    ///
    /// Idempotent, and harmless after the task has already run.
    fn cancel(&self);
}

/// Port for presenting the visible notification.
///
/// This abstraction is the seam between the notification center and whatever
/// actually paints notices (a GUI layer, a TUI, a log line, a web bridge).
/// Infrastructure provides concrete implementations (HookSurface, NullSurface,
/// MockSurface).
///
/// # Contract
/// * `render` replaces whatever the surface currently shows.
/// * `clear` on an empty surface is a no-op.
/// * The center never holds its internal lock while calling either method, so
///   implementations may call back into the center; it also means a panic in
///   `render` propagates to the `show` caller without poisoning center state.
pub trait Surface: Send + Sync + Debug {
    /// Display `notification`, replacing any current display.
    fn render(&self, notification: &Notification);

    /// Remove the current display, if any.
    fn clear(&self);
}
