//! Activates a window by search term from an async runtime.
//!
//! To run this example:
//! ```bash
//! cargo run --example async_activate --features async -- notepad process
//! ```

#[cfg(feature = "async")]
use window_tracker::{SearchScope, WindowTracker};

#[cfg(feature = "async")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let term = args.next().ok_or("usage: async_activate <term> [title|process]")?;
    let scope: SearchScope = match args.next() {
        Some(scope) => scope.parse()?,
        None => SearchScope::default(),
    };

    let tracker = WindowTracker::new()?;
    let before = tracker.observe_foreground_async().await?;
    println!("🔍 Currently active: {}", before.identity);

    let result = tracker.activate_by_search_async(term.clone(), scope).await?;
    if result.success {
        println!(
            "✅ Activated '{term}' via {} after {} pass(es)",
            result.strategy_used, result.attempts_used
        );
    } else {
        println!("❌ Could not activate '{term}' after {} passes", result.attempts_used);
    }

    let after = tracker.observe_foreground_async().await?;
    println!("📱 Now active: {}", after.identity);

    let back = tracker
        .activate_by_pid_async(before.identity.process_id)
        .await?;
    println!("⏪ Switched back: {}", back.success);

    Ok(())
}

#[cfg(not(feature = "async"))]
fn main() {
    println!("This example requires the 'async' feature to be enabled.");
    println!("Run with: cargo run --example async_activate --features async");
}
