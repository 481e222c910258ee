//! Mock scheduler for testing.

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Scheduler, TimerHandle, TimerTask};
use crate::infrastructure::mocks::MockClock;
use crate::infrastructure::scheduler::run_contained;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Mock scheduler that fires timers on manually advanced time.
///
/// Scheduled tasks are queued with an absolute due instant taken from the
/// scheduler's [`MockClock`]. [`advance`](MockScheduler::advance) moves the
/// clock forward and runs every task that falls due, in due order, setting
/// the clock to each task's due instant before running it. A fired task can
/// therefore observe consistent time and schedule follow-up timers of its
/// own, which the same `advance` call will fire if they also fall due.
///
/// Panicking tasks are contained exactly like the production scheduler:
/// caught, logged, and counted when a metrics registry is attached.
///
/// # Examples
///
/// ```
/// use damper::{MockScheduler, Scheduler};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::time::{Duration, Instant};
///
/// let scheduler = MockScheduler::new(Instant::now());
/// let ran = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&ran);
///
/// scheduler.schedule(
///     Duration::from_millis(100),
///     Box::new(move || flag.store(true, Ordering::SeqCst)),
/// );
///
/// scheduler.advance(Duration::from_millis(99));
/// assert!(!ran.load(Ordering::SeqCst));
///
/// scheduler.advance(Duration::from_millis(1));
/// assert!(ran.load(Ordering::SeqCst));
/// ```
///
/// # Thread Safety
///
/// Clones share the same clock and timer queue, so a clone handed to a
/// component under test is driven by `advance` calls on the original. The
/// attached metrics registry is per clone; panics are counted against the
/// registry of the clone that scheduled the task.
#[derive(Clone)]
pub struct MockScheduler {
    clock: MockClock,
    timers: Arc<Mutex<Vec<PendingTimer>>>,
    seq: Arc<AtomicU64>,
    metrics: Option<Metrics>,
}

struct PendingTimer {
    due: Instant,
    seq: u64,
    slot: Arc<Mutex<Option<TimerTask>>>,
}

impl MockScheduler {
    /// Create a mock scheduler with its own clock starting at `start`.
    pub fn new(start: Instant) -> Self {
        Self::from_clock(MockClock::new(start))
    }

    /// Create a mock scheduler driving (and driven by) an existing clock.
    ///
    /// Useful when the component under test takes a `Clock` and a
    /// `Scheduler` separately and both must agree on the current time.
    pub fn from_clock(clock: MockClock) -> Self {
        Self {
            clock,
            timers: Arc::new(Mutex::new(Vec::new())),
            seq: Arc::new(AtomicU64::new(0)),
            metrics: None,
        }
    }

    /// Attach a metrics registry so contained panics are counted.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The clock this scheduler stamps due instants with.
    pub fn clock(&self) -> MockClock {
        self.clock.clone()
    }

    /// Advance time by `step`, firing every timer that falls due.
    ///
    /// Timers fire in due order (registration order breaks ties), with the
    /// queue lock released around each task so fired tasks can schedule or
    /// cancel timers themselves.
    pub fn advance(&self, step: Duration) {
        let target = self.clock.now() + step;

        loop {
            let next = {
                let mut timers = self.lock_timers();
                timers.retain(|timer| timer.slot.lock().map_or(false, |slot| slot.is_some()));
                let due_index = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due <= target)
                    .min_by_key(|(_, timer)| (timer.due, timer.seq))
                    .map(|(index, _)| index);
                due_index.map(|index| timers.remove(index))
            };

            let timer = match next {
                Some(timer) => timer,
                None => break,
            };

            if timer.due > self.clock.now() {
                self.clock.set(timer.due);
            }
            let task = timer
                .slot
                .lock()
                .expect("MockScheduler slot poisoned - a test thread panicked while holding the lock")
                .take();
            if let Some(task) = task {
                run_contained(task, self.metrics.as_ref());
            }
        }

        self.clock.set(target);
    }

    /// Number of scheduled tasks that have neither fired nor been cancelled.
    pub fn pending_count(&self) -> usize {
        self.lock_timers()
            .iter()
            .filter(|timer| timer.slot.lock().map_or(false, |slot| slot.is_some()))
            .count()
    }

    fn lock_timers(&self) -> std::sync::MutexGuard<'_, Vec<PendingTimer>> {
        self.timers
            .lock()
            .expect("MockScheduler mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl Scheduler for MockScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> Box<dyn TimerHandle> {
        let slot = Arc::new(Mutex::new(Some(task)));
        let timer = PendingTimer {
            due: self.clock.now() + delay,
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            slot: Arc::clone(&slot),
        };
        self.lock_timers().push(timer);
        Box::new(MockTimerHandle { slot })
    }
}

impl fmt::Debug for MockScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockScheduler")
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

/// Handle to a task queued in a [`MockScheduler`].
struct MockTimerHandle {
    slot: Arc<Mutex<Option<TimerTask>>>,
}

impl TimerHandle for MockTimerHandle {
    fn cancel(&self) {
        self.slot
            .lock()
            .expect("MockScheduler slot poisoned - a test thread panicked while holding the lock")
            .take();
    }
}

impl fmt::Debug for MockTimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = self.slot.lock().map_or(false, |slot| slot.is_some());
        f.debug_struct("MockTimerHandle")
            .field("pending", &pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording_task(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> TimerTask {
        let log = Arc::clone(log);
        Box::new(move || log.lock().unwrap().push(label))
    }

    #[test]
    fn test_fires_in_due_order() {
        let scheduler = MockScheduler::new(Instant::now());
        let log = Arc::new(Mutex::new(Vec::new()));

        scheduler.schedule(Duration::from_millis(30), recording_task(&log, "late"));
        scheduler.schedule(Duration::from_millis(10), recording_task(&log, "early"));
        scheduler.schedule(Duration::from_millis(20), recording_task(&log, "middle"));

        scheduler.advance(Duration::from_millis(100));
        assert_eq!(*log.lock().unwrap(), vec!["early", "middle", "late"]);
    }

    #[test]
    fn test_ties_fire_in_registration_order() {
        let scheduler = MockScheduler::new(Instant::now());
        let log = Arc::new(Mutex::new(Vec::new()));

        scheduler.schedule(Duration::from_millis(10), recording_task(&log, "first"));
        scheduler.schedule(Duration::from_millis(10), recording_task(&log, "second"));

        scheduler.advance(Duration::from_millis(10));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_not_due_timers_stay_pending() {
        let scheduler = MockScheduler::new(Instant::now());
        let log = Arc::new(Mutex::new(Vec::new()));

        scheduler.schedule(Duration::from_millis(50), recording_task(&log, "task"));
        scheduler.advance(Duration::from_millis(49));

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(scheduler.pending_count(), 1);

        scheduler.advance(Duration::from_millis(1));
        assert_eq!(*log.lock().unwrap(), vec!["task"]);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let scheduler = MockScheduler::new(Instant::now());
        let log = Arc::new(Mutex::new(Vec::new()));

        let handle = scheduler.schedule(Duration::from_millis(10), recording_task(&log, "task"));
        handle.cancel();
        // Cancel is idempotent.
        handle.cancel();

        scheduler.advance(Duration::from_millis(100));
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_fired_task_sees_its_due_time_and_can_reschedule() {
        let scheduler = MockScheduler::new(Instant::now());
        let clock = scheduler.clock();
        let start = clock.now();
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner_log = Arc::clone(&log);
        let inner_scheduler = scheduler.clone();
        let inner_clock = clock.clone();
        scheduler.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                assert_eq!(inner_clock.now(), start + Duration::from_millis(10));
                inner_scheduler.schedule(
                    Duration::from_millis(10),
                    recording_task(&inner_log, "follow-up"),
                );
            }),
        );

        // One advance covers both the original timer and its follow-up.
        scheduler.advance(Duration::from_millis(20));
        assert_eq!(*log.lock().unwrap(), vec!["follow-up"]);
        assert_eq!(clock.now(), start + Duration::from_millis(20));
    }

    #[test]
    fn test_panicking_task_is_contained() {
        let metrics = Metrics::new();
        let scheduler = MockScheduler::new(Instant::now()).with_metrics(metrics.clone());
        let log = Arc::new(Mutex::new(Vec::new()));

        scheduler.schedule(Duration::from_millis(10), Box::new(|| panic!("boom")));
        scheduler.schedule(Duration::from_millis(20), recording_task(&log, "survivor"));

        scheduler.advance(Duration::from_millis(30));

        // The panic was contained and the later timer still fired.
        assert_eq!(metrics.snapshot().callback_panics, 1);
        assert_eq!(*log.lock().unwrap(), vec!["survivor"]);
    }

    #[test]
    fn test_shared_clock_advances_with_scheduler() {
        let clock = MockClock::new(Instant::now());
        let start = clock.now();
        let scheduler = MockScheduler::from_clock(clock.clone());

        scheduler.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), start + Duration::from_millis(250));
    }
}
