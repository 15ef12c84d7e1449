//! Counter Machine
//!
//! This example demonstrates the basic flop lifecycle.
//!
//! Key concepts:
//! - Label derived from the state bag, no transition table
//! - Entry callback fires once when the label changes
//! - Closed gate and unknown actions are silent no-ops
//!
//! Run with: RUST_LOG=flipflop=debug cargo run --example counter

use flipflop::Registry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Default, Clone, Debug)]
struct Counter {
    count: u32,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,flipflop=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Counter Machine ===\n");

    let registry: Registry<Counter, &'static str, u32> = Registry::new();

    registry
        .machine("counter")
        .derive(|c: &Counter| if c.count >= 3 { "ready" } else { "waiting" })
        .bind("increment", |c: &mut Counter, by: u32| c.count += by)
        .on("waiting", |c: &Counter| println!("  entered waiting at {}", c.count))
        .on("ready", |c: &Counter| println!("  entered ready at {}", c.count))
        .init(Counter { count: 0 });

    let counter = registry.machine("counter");
    for _ in 0..4 {
        counter.trigger("increment", 1);
        println!(
            "count = {}, label = {:?}",
            counter.state().count,
            counter.current_label()
        );
    }

    println!("\nUnknown action:");
    if let Err(err) = counter.try_trigger("decrement", 1) {
        println!("  {err}");
    }

    println!("\nClosed gate:");
    counter.reject_events().trigger("increment", 10);
    println!("  count still {}", counter.state().count);

    println!("\nHistory:");
    for transition in counter.history().transitions() {
        println!(
            "  {:?} -> {:?} ({:?})",
            transition.from, transition.to, transition.cause
        );
    }

    println!("\n=== Example Complete ===");
}
