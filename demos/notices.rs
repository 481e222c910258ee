//! Notification center walkthrough: replacement, dismissal, and expiry.
//!
//! Renders each notice as its canonical markup fragment through a
//! `HookSurface`, showing that only one notice is ever visible and that a
//! replaced notice's auto-dismiss never fires.

use damper::{notification_markup, HookSurface, NotificationCenter, NotificationKind};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let surface = HookSurface::new(
        |notice| println!("  [surface] {}", notification_markup(notice)),
        || println!("  [surface] (cleared)"),
    );

    let center = NotificationCenter::builder()
        .with_surface(Arc::new(surface))
        .with_default_ttl(Duration::from_millis(800))
        .build()?;

    println!("=== Replacement ===\n");
    println!("Showing an error, then replacing it 300ms later:\n");

    center.show("Please fill in all required fields", NotificationKind::Error);
    tokio::time::sleep(Duration::from_millis(300)).await;
    center.show("Your request has been received", NotificationKind::Success);

    // Past the error's would-be expiry; only the success notice is up.
    tokio::time::sleep(Duration::from_millis(600)).await;
    println!(
        "\n  still visible: {:?}",
        center.current().map(|notice| notice.message)
    );

    // And 800ms after it was shown, the success notice expires on its own.
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("  after ttl: {:?}\n", center.current().map(|n| n.message));

    println!("=== Manual dismissal ===\n");
    center.show("Saved", NotificationKind::Success);
    tokio::time::sleep(Duration::from_millis(100)).await;
    center.dismiss();
    println!("\n  dismissing again is a no-op: {}", center.dismiss());

    println!("\n=== Untrusted input is escaped ===\n");
    let shown = center.show(
        r#"<script>alert("xss")</script>"#,
        NotificationKind::Error,
    );
    println!("\n  raw message stayed intact: {:?}", shown.message);
    tokio::time::sleep(Duration::from_millis(100)).await;
    center.dismiss();

    let snapshot = center.metrics().snapshot();
    println!("\n=== Metrics ===\n");
    println!(
        "shown {}, replaced {}, dismissed {}, expired {}",
        snapshot.notices_shown,
        snapshot.notices_replaced,
        snapshot.notices_dismissed,
        snapshot.notices_expired
    );

    Ok(())
}
