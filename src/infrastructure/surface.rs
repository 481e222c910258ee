//! Render surfaces for the notification center.
//!
//! A surface is where the one visible notification actually appears. The
//! center only ever talks to the [`Surface`] port; the adapters here cover
//! the common cases: a hook surface that forwards to host closures, a null
//! surface for headless use, and a pure markup formatter for hosts that
//! render HTML-like fragments.

use crate::application::ports::Surface;
use crate::domain::notification::Notification;

use std::fmt;

/// Escape text for safe embedding in a markup fragment.
///
/// Replaces `&`, `<`, `>`, `"`, and `'` with their entity forms. `&` is
/// handled first so already produced entities are never double-escaped from
/// the replacement text itself.
///
/// # Example
/// ```
/// use damper::escape_text;
///
/// assert_eq!(
///     escape_text(r#"<img onerror="x()">"#),
///     "&lt;img onerror=&quot;x()&quot;&gt;"
/// );
/// ```
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Format the canonical markup fragment for a notification.
///
/// The message text is escaped; a raw message can never inject elements into
/// the fragment. Pure function, no I/O.
///
/// # Example
/// ```
/// use damper::{notification_markup, Notification, NotificationKind};
/// use std::time::Instant;
///
/// let notice = Notification::new("Saved", NotificationKind::Success, Instant::now());
/// let markup = notification_markup(&notice);
///
/// assert!(markup.contains(r#"class="notification success""#));
/// assert!(markup.contains("Saved"));
/// ```
pub fn notification_markup(notification: &Notification) -> String {
    let icon = match notification.kind {
        crate::domain::notification::NotificationKind::Success => "✓",
        crate::domain::notification::NotificationKind::Error => "⚠",
    };
    format!(
        concat!(
            r#"<div class="notification {kind}" role="status">"#,
            r#"<span class="notification-icon">{icon}</span>"#,
            r#"<span class="notification-message">{message}</span>"#,
            r#"<button class="notification-close">×</button>"#,
            "</div>"
        ),
        kind = notification.kind.as_str(),
        icon = icon,
        message = escape_text(&notification.message),
    )
}

/// Surface that forwards render and clear calls to host closures.
///
/// This is how a host (a GUI layer, a TUI, a web bridge) attaches real
/// output without implementing the [`Surface`] trait itself.
///
/// # Example
/// ```
/// use damper::{notification_markup, HookSurface, NotificationCenter, NotificationKind};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let surface = HookSurface::new(
///     |notice| println!("{}", notification_markup(notice)),
///     || println!("(cleared)"),
/// );
/// let center = NotificationCenter::new(Arc::new(surface));
/// center.show("Profile saved", NotificationKind::Success);
/// # }
/// ```
pub struct HookSurface {
    render: Box<dyn Fn(&Notification) + Send + Sync>,
    clear: Box<dyn Fn() + Send + Sync>,
}

impl HookSurface {
    /// Create a surface from a render hook and a clear hook.
    pub fn new<R, C>(render: R, clear: C) -> Self
    where
        R: Fn(&Notification) + Send + Sync + 'static,
        C: Fn() + Send + Sync + 'static,
    {
        Self {
            render: Box::new(render),
            clear: Box::new(clear),
        }
    }
}

impl Surface for HookSurface {
    fn render(&self, notification: &Notification) {
        (self.render)(notification);
    }

    fn clear(&self) {
        (self.clear)();
    }
}

impl fmt::Debug for HookSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSurface")
            .field("render", &"<fn>")
            .field("clear", &"<fn>")
            .finish()
    }
}

/// Surface that discards everything.
///
/// The default for headless use, where only [`current`] state and metrics
/// are observed.
///
/// [`current`]: crate::application::center::NotificationCenter::current
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl NullSurface {
    /// Create a new null surface.
    pub fn new() -> Self {
        Self
    }
}

impl Surface for NullSurface {
    fn render(&self, _notification: &Notification) {}

    fn clear(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::NotificationKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_escape_plain_text_unchanged() {
        assert_eq!(escape_text("Profile saved"), "Profile saved");
        assert_eq!(escape_text(""), "");
    }

    #[test]
    fn test_escape_all_special_characters() {
        assert_eq!(
            escape_text(r#"<b>&"quoted"&'single'</b>"#),
            "&lt;b&gt;&amp;&quot;quoted&quot;&amp;&#39;single&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_escape_ampersand_first() {
        // An entity in the input is escaped as text, not preserved.
        assert_eq!(escape_text("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_markup_success_fragment() {
        let notice = Notification::new("Saved", NotificationKind::Success, Instant::now());
        let markup = notification_markup(&notice);

        assert!(markup.starts_with(r#"<div class="notification success" role="status">"#));
        assert!(markup.contains(r#"<span class="notification-icon">✓</span>"#));
        assert!(markup.contains(r#"<span class="notification-message">Saved</span>"#));
        assert!(markup.ends_with("</div>"));
    }

    #[test]
    fn test_markup_error_icon() {
        let notice = Notification::new("Failed", NotificationKind::Error, Instant::now());
        let markup = notification_markup(&notice);

        assert!(markup.contains(r#"class="notification error""#));
        assert!(markup.contains("⚠"));
    }

    #[test]
    fn test_markup_escapes_message() {
        let notice = Notification::new(
            r#"<script>alert("x")</script>"#,
            NotificationKind::Error,
            Instant::now(),
        );
        let markup = notification_markup(&notice);

        assert!(!markup.contains("<script>"));
        assert!(markup.contains("&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"));
    }

    #[test]
    fn test_hook_surface_forwards() {
        let rendered = Arc::new(AtomicUsize::new(0));
        let cleared = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&rendered);
        let c = Arc::clone(&cleared);

        let surface = HookSurface::new(
            move |_notice| {
                r.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                c.fetch_add(1, Ordering::SeqCst);
            },
        );

        let notice = Notification::new("hi", NotificationKind::Success, Instant::now());
        surface.render(&notice);
        surface.render(&notice);
        surface.clear();

        assert_eq!(rendered.load(Ordering::SeqCst), 2);
        assert_eq!(cleared.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_null_surface_is_silent() {
        let surface = NullSurface::new();
        let notice = Notification::new("hi", NotificationKind::Success, Instant::now());
        surface.render(&notice);
        surface.clear();
    }
}
