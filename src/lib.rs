//! # damper
//!
//! Debounce and throttle gates plus a single-slot, auto-expiring notification
//! center for event-driven applications.
//!
//! Bursty event sources (keystrokes, scroll positions, resize storms) should
//! not translate one-to-one into expensive work. This crate wraps a callback
//! so it runs only after the burst settles ([`debounce`]) or at most once per
//! window ([`throttle`]), and manages transient status notices where the
//! latest notice always wins ([`NotificationCenter`]).
//!
//! Everything time-dependent goes through explicit [`Clock`] and
//! [`Scheduler`] ports, so tests drive time manually instead of sleeping.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use damper::{debounce, throttle};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), damper::ConfigError> {
//! // Run the search only after typing pauses for 300ms.
//! let on_input = debounce(Duration::from_millis(300), |query: String| {
//!     println!("searching for {query}");
//! })?;
//! on_input.call("rust deb".to_string());
//! on_input.call("rust debounce".to_string()); // supersedes the first call
//!
//! // Repaint at most every 200ms while scrolling.
//! let on_scroll = throttle(Duration::from_millis(200), |position: u32| {
//!     println!("repainting at {position}");
//! })?;
//! on_scroll.call(42);  // runs immediately
//! on_scroll.call(43);  // inside the window: dropped
//! # Ok(())
//! # }
//! ```
//!
//! ## Notifications
//!
//! ```rust,no_run
//! use damper::{notification_markup, HookSurface, NotificationCenter, NotificationKind};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let surface = HookSurface::new(
//!     |notice| println!("{}", notification_markup(notice)),
//!     || println!("(cleared)"),
//! );
//! let center = NotificationCenter::new(Arc::new(surface));
//!
//! center.show("Could not reach the server", NotificationKind::Error);
//! center.show("Saved", NotificationKind::Success); // replaces the error
//! // "Saved" auto-dismisses 5 seconds later unless replaced or dismissed.
//! # }
//! ```
//!
//! ## Deterministic Tests
//!
//! With the `test-helpers` feature (on by default), the mock adapters drive
//! time manually:
//!
//! ```rust
//! use damper::{Debouncer, Metrics, MockScheduler};
//! use std::sync::{Arc, Mutex};
//! use std::time::{Duration, Instant};
//!
//! let scheduler = MockScheduler::new(Instant::now());
//! let fired = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&fired);
//!
//! let debouncer = Debouncer::new(
//!     Arc::new(scheduler.clone()),
//!     Metrics::new(),
//!     Duration::from_millis(100),
//!     move |arg: u32| sink.lock().unwrap().push(arg),
//! )
//! .unwrap();
//!
//! debouncer.call(1);
//! debouncer.call(2);
//! scheduler.advance(Duration::from_millis(100));
//! assert_eq!(*fired.lock().unwrap(), vec![2]);
//! ```
//!
//! ## Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - **Domain** ([`domain`]): pure gate state machines and the notification
//!   value type. No timers, no I/O.
//! - **Application** ([`application`]): the wrappers and the center,
//!   orchestrating domain gates through ports.
//! - **Infrastructure** ([`infrastructure`]): Tokio and system-clock
//!   adapters, render surfaces, and mock adapters for tests.
//!
//! ## Semantics at a Glance
//!
//! | Wrapper | First call | During the window | After the window |
//! |---------|-----------|-------------------|------------------|
//! | [`debounce`] | deferred `wait` | each call re-defers, latest payload kept | fires once |
//! | [`throttle`] | runs immediately | dropped (not queued) | next call runs |
//!
//! The notification center holds exactly one visible notice: `show` evicts
//! and replaces, `dismiss` removes early, and an undisturbed notice expires
//! after its time to live (5 seconds by default).

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::center::{BuildError, NotificationCenter, NotificationCenterBuilder};
pub use application::debouncer::{debounce, Debouncer};
pub use application::keyed::{KeyedDebouncer, KeyedThrottler};
pub use application::metrics::{Metrics, MetricsSnapshot};
pub use application::ports::{Clock, Scheduler, Surface, TimerHandle, TimerTask};
pub use application::throttler::{throttle, Throttler};
pub use application::ConfigError;
pub use domain::gate::{DebounceGate, GateDecision, ThrottleGate};
pub use domain::notification::{Notification, NotificationKind, DEFAULT_TTL};
pub use infrastructure::clock::SystemClock;
pub use infrastructure::scheduler::TokioScheduler;
pub use infrastructure::surface::{escape_text, notification_markup, HookSurface, NullSurface};

#[cfg(any(test, feature = "test-helpers"))]
pub use infrastructure::mocks::{MockClock, MockScheduler, MockSurface, SurfaceEvent};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    // End-to-end: one metrics registry shared across every component.
    #[test]
    fn test_shared_metrics_across_components() {
        let metrics = Metrics::new();
        let clock = MockClock::new(Instant::now());
        let scheduler = MockScheduler::from_clock(clock.clone()).with_metrics(metrics.clone());

        let debounced = Debouncer::new(
            Arc::new(scheduler.clone()),
            metrics.clone(),
            Duration::from_millis(100),
            |_: u32| {},
        )
        .unwrap();
        let throttled = Throttler::new(
            Arc::new(clock.clone()),
            metrics.clone(),
            Duration::from_millis(100),
            |_: u32| {},
        )
        .unwrap();
        let center = NotificationCenter::builder()
            .with_clock(Arc::new(clock))
            .with_scheduler(Arc::new(scheduler.clone()))
            .with_metrics(metrics.clone())
            .build()
            .unwrap();

        debounced.call(1);
        debounced.call(2);
        throttled.call(1);
        throttled.call(2);
        center.show("Saved", NotificationKind::Success);
        scheduler.advance(Duration::from_secs(10));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.debounce_scheduled, 2);
        assert_eq!(snapshot.debounce_fired, 1);
        assert_eq!(snapshot.throttle_invoked, 1);
        assert_eq!(snapshot.throttle_dropped, 1);
        assert_eq!(snapshot.notices_shown, 1);
        assert_eq!(snapshot.notices_expired, 1);
    }

    // The distilled timing contract, end to end through the public API.
    #[test]
    fn test_debounce_timing_contract() {
        let scheduler = MockScheduler::new(Instant::now());
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);

        let debounced = Debouncer::new(
            Arc::new(scheduler.clone()),
            Metrics::new(),
            Duration::from_millis(100),
            move |arg: u32| sink.lock().unwrap().push(arg),
        )
        .unwrap();

        // t=0, t=30, t=60 -> one fire at t=160 with the t=60 payload.
        debounced.call(0);
        scheduler.advance(Duration::from_millis(30));
        debounced.call(30);
        scheduler.advance(Duration::from_millis(30));
        debounced.call(60);
        scheduler.advance(Duration::from_millis(100));

        assert_eq!(*fired.lock().unwrap(), vec![60]);
    }
}
