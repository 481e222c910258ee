//! The transient notification value type.
//!
//! A notification is a plain value: message, kind, birth instant, and time to
//! live. Which notification is visible (at most one) and when it leaves the
//! screen is decided by the notification center in the application layer.

use std::fmt;
use std::time::{Duration, Instant};

/// How long a notification stays visible unless overridden per notice.
pub const DEFAULT_TTL: Duration = Duration::from_millis(5000);

/// Visual category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// Confirmation that an action worked
    Success,
    /// Something went wrong and the user should know
    Error,
}

impl NotificationKind {
    /// Stable lowercase name, used for markup classes and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        }
    }

    /// Check if this kind is Success.
    pub fn is_success(&self) -> bool {
        matches!(self, NotificationKind::Success)
    }

    /// Check if this kind is Error.
    pub fn is_error(&self) -> bool {
        matches!(self, NotificationKind::Error)
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient status notice.
///
/// The message is stored exactly as supplied; escaping for markup happens at
/// the render boundary, never here.
///
/// # Example
/// ```
/// use damper::{Notification, NotificationKind, DEFAULT_TTL};
/// use std::time::{Duration, Instant};
///
/// let shown_at = Instant::now();
/// let notice = Notification::new("Profile saved", NotificationKind::Success, shown_at);
///
/// assert_eq!(notice.ttl, DEFAULT_TTL);
/// assert!(!notice.is_expired(shown_at));
/// assert!(notice.is_expired(shown_at + DEFAULT_TTL));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Raw, unescaped message text
    pub message: String,
    /// Visual category
    pub kind: NotificationKind,
    /// Instant the notification was created
    pub created_at: Instant,
    /// How long it stays visible
    pub ttl: Duration,
}

impl Notification {
    /// Create a notification with the default time to live.
    pub fn new(message: impl Into<String>, kind: NotificationKind, created_at: Instant) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at,
            ttl: DEFAULT_TTL,
        }
    }

    /// Override the time to live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Instant at which this notification should leave the screen.
    pub fn expires_at(&self) -> Instant {
        self.created_at + self.ttl
    }

    /// Check whether the notification has expired at `now`.
    ///
    /// A notification is expired at exactly `expires_at()`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }

    /// Time left on screen at `now`, saturating at zero.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at().saturating_duration_since(now)
    }
}
