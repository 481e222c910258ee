//! Behavior on the real Tokio scheduler.
//!
//! Paused-clock tests pin exact timings; the remaining tests run against
//! real timers with generous margins.

use damper::{
    debounce, throttle, Debouncer, Metrics, NotificationCenter, NotificationKind, TokioScheduler,
};

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Let spawned timer tasks observe advanced time and run.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn debounce_fires_once_after_quiet_period() {
    let fired = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&fired);
    let debounced = debounce(Duration::from_millis(100), move |arg: u32| {
        sink.lock().unwrap().push(arg);
    })
    .unwrap();

    debounced.call(1);
    settle().await;
    tokio::time::advance(Duration::from_millis(30)).await;
    settle().await;
    debounced.call(2);
    settle().await;

    tokio::time::advance(Duration::from_millis(99)).await;
    settle().await;
    assert!(fired.lock().unwrap().is_empty(), "quiet period not over");

    tokio::time::advance(Duration::from_millis(1)).await;
    settle().await;
    assert_eq!(*fired.lock().unwrap(), vec![2]);

    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(*fired.lock().unwrap(), vec![2], "no second fire");
}

#[tokio::test(start_paused = true)]
async fn debounce_drop_cancels_the_spawned_timer() {
    let count = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&count);
    let debounced = debounce(Duration::from_millis(50), move |_: ()| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    debounced.call(());
    settle().await;
    drop(debounced);

    tokio::time::advance(Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn throttle_reopens_after_the_real_window() {
    let count = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&count);
    let throttled = throttle(Duration::from_millis(50), move |_: ()| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    assert!(throttled.call(()).is_run());
    assert!(throttled.call(()).is_drop());

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(throttled.call(()).is_run());
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn panicking_deferred_callback_is_contained() {
    let metrics = Metrics::new();
    let scheduler = Arc::new(TokioScheduler::new().with_metrics(metrics.clone()));
    let fired = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&fired);

    let debounced = Debouncer::new(
        scheduler,
        metrics.clone(),
        Duration::from_millis(10),
        move |arg: u32| {
            if arg == 13 {
                panic!("unlucky");
            }
            counter.fetch_add(1, Ordering::SeqCst);
        },
    )
    .unwrap();

    debounced.call(13);
    settle().await;
    tokio::time::advance(Duration::from_millis(10)).await;
    settle().await;
    assert_eq!(metrics.snapshot().callback_panics, 1);

    // The debouncer and the runtime both survived the contained panic.
    debounced.call(7);
    settle().await;
    tokio::time::advance(Duration::from_millis(10)).await;
    settle().await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn notification_expires_on_the_real_scheduler() {
    let center = NotificationCenter::builder()
        .with_default_ttl(Duration::from_millis(200))
        .build()
        .unwrap();

    center.show("Saved", NotificationKind::Success);
    settle().await;
    assert!(center.current().is_some());

    tokio::time::advance(Duration::from_millis(199)).await;
    settle().await;
    assert!(center.current().is_some(), "one tick early");

    tokio::time::advance(Duration::from_millis(1)).await;
    settle().await;
    assert!(center.current().is_none(), "expired at the ttl");
    assert_eq!(center.metrics().snapshot().notices_expired, 1);
}

#[tokio::test(start_paused = true)]
async fn replacement_outlives_the_displaced_expiry() {
    let center = NotificationCenter::builder()
        .with_default_ttl(Duration::from_millis(100))
        .build()
        .unwrap();

    center.show("A", NotificationKind::Success);
    settle().await;
    tokio::time::advance(Duration::from_millis(50)).await;
    settle().await;
    center.show("B", NotificationKind::Error);
    settle().await;

    // Past A's would-be expiry; B remains.
    tokio::time::advance(Duration::from_millis(60)).await;
    settle().await;
    assert_eq!(
        center.current().map(|notice| notice.message),
        Some("B".to_string())
    );

    tokio::time::advance(Duration::from_millis(40)).await;
    settle().await;
    assert!(center.current().is_none());
}

#[tokio::test]
async fn dismiss_races_cleanly_with_real_timers() {
    let center = NotificationCenter::builder()
        .with_default_ttl(Duration::from_millis(30))
        .build()
        .unwrap();

    // Dismiss right around the ttl repeatedly; whichever side wins, the
    // slot must end empty and nothing may panic.
    for _ in 0..20 {
        center.show("racy", NotificationKind::Success);
        tokio::time::sleep(Duration::from_millis(25)).await;
        center.dismiss();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(center.current().is_none());
    }
}
