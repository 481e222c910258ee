//! Mock surface for testing.

use crate::application::ports::Surface;
use crate::domain::notification::Notification;

use std::sync::{Arc, Mutex};

/// An event observed by a [`MockSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// A notification was rendered
    Rendered(Notification),
    /// The display was cleared
    Cleared,
}

/// Mock surface that records render and clear calls for assertions.
///
/// # Examples
///
/// ```
/// use damper::{MockSurface, Notification, NotificationKind, Surface, SurfaceEvent};
/// use std::time::Instant;
///
/// let surface = MockSurface::new();
/// let notice = Notification::new("Saved", NotificationKind::Success, Instant::now());
///
/// surface.render(&notice);
/// surface.clear();
///
/// assert_eq!(surface.count(), 2);
/// assert_eq!(surface.events()[1], SurfaceEvent::Cleared);
/// assert_eq!(surface.last_rendered(), Some(notice));
/// ```
///
/// # Thread Safety
///
/// Clones share the same event log, so the clone handed to a notification
/// center and the clone kept by the test observe the same history.
#[derive(Debug, Clone, Default)]
pub struct MockSurface {
    events: Arc<Mutex<Vec<SurfaceEvent>>>,
}

impl MockSurface {
    /// Create a new mock surface with an empty event log.
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get all recorded events in order.
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.lock_events().clone()
    }

    /// Get the count of recorded events.
    pub fn count(&self) -> usize {
        self.lock_events().len()
    }

    /// The most recently rendered notification, if any render happened.
    pub fn last_rendered(&self) -> Option<Notification> {
        self.lock_events()
            .iter()
            .rev()
            .find_map(|event| match event {
                SurfaceEvent::Rendered(notification) => Some(notification.clone()),
                SurfaceEvent::Cleared => None,
            })
    }

    /// Clear the recorded event log.
    ///
    /// Useful for resetting state between test phases; does not affect what
    /// the surface would display.
    pub fn clear_captured(&self) {
        self.lock_events().clear();
    }

    fn lock_events(&self) -> std::sync::MutexGuard<'_, Vec<SurfaceEvent>> {
        self.events
            .lock()
            .expect("MockSurface mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl Surface for MockSurface {
    fn render(&self, notification: &Notification) {
        self.lock_events()
            .push(SurfaceEvent::Rendered(notification.clone()));
    }

    fn clear(&self) {
        self.lock_events().push(SurfaceEvent::Cleared);
    }
}
