//! Tracks the foreground window and prints the recency history as it changes.
//!
//! Usage: cargo run --example recent_windows

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use window_tracker::{WindowIdentity, WindowTracker};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("🔍 Tracking recently active windows...");
    println!("   Switch between applications to build up the history.");
    println!("   Press Ctrl+C to exit.");
    println!();

    let tracker = WindowTracker::new()?;
    let report = tracker.bootstrap()?;
    println!(
        "📋 Bootstrapped {} windows ({} probes completed)",
        report.seeded,
        report.completed.len()
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        println!("\n👋 Received Ctrl+C, shutting down...");
        r.store(false, Ordering::SeqCst);
    })?;

    let mut last: Option<WindowIdentity> = None;
    while running.load(Ordering::SeqCst) {
        match tracker.observe_foreground() {
            Ok(current) if last.as_ref() != Some(&current.identity) => {
                println!("📱 {}", current.identity);
                for (index, entry) in tracker.snapshot()?.iter().enumerate().skip(1) {
                    println!("   {index}: {}", entry.identity);
                }
                println!();
                last = Some(current.identity);
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("No foreground window: {e}"),
        }
        std::thread::sleep(Duration::from_millis(250));
    }

    if let Some(previous) = tracker.previous_window(&[])? {
        println!("⏪ Previous window was {}", previous.identity);
    }

    Ok(())
}
