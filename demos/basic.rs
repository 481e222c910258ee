//! Basic example demonstrating debounce and throttle wrappers.
//!
//! This example simulates a burst of keystrokes against a debounced search
//! handler and a stream of scroll events against a throttled repaint
//! handler, then prints the metrics both collected.

use damper::{Debouncer, Metrics, Throttler, TokioScheduler};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let metrics = Metrics::new();

    println!("=== Debounce Example ===\n");
    println!("Typing \"damper\" one keystroke every 50ms; search runs 200ms after the last one\n");

    let search = Debouncer::new(
        Arc::new(TokioScheduler::new().with_metrics(metrics.clone())),
        metrics.clone(),
        Duration::from_millis(200),
        |query: String| println!("  -> searching for {query:?}"),
    )?;

    let word = "damper";
    for end in 1..=word.len() {
        let query = word[..end].to_string();
        println!("  keystroke: {query:?}");
        search.call(query);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // Let the quiet period elapse so the single search fires.
    tokio::time::sleep(Duration::from_millis(250)).await;

    println!("\n=== Throttle Example ===\n");
    println!("30 scroll events 10ms apart; repaint at most every 100ms\n");

    let repaint = Throttler::new(
        Arc::new(damper::SystemClock::new()),
        metrics.clone(),
        Duration::from_millis(100),
        |position: u32| println!("  -> repainting at scroll position {position}"),
    )?;

    for tick in 0..30u32 {
        repaint.call(tick * 40);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let snapshot = metrics.snapshot();
    println!("\n=== Metrics ===\n");
    println!(
        "debounce: {} calls, {} coalesced away, {} fired ({:.0}% coalesced)",
        snapshot.debounce_scheduled,
        snapshot.debounce_coalesced,
        snapshot.debounce_fired,
        snapshot.debounce_coalesce_rate() * 100.0
    );
    println!(
        "throttle: {} invoked, {} dropped ({:.0}% dropped)",
        snapshot.throttle_invoked,
        snapshot.throttle_dropped,
        snapshot.throttle_drop_rate() * 100.0
    );

    Ok(())
}
