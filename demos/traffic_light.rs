//! Traffic Light Machine
//!
//! This example demonstrates a cyclic machine with enum labels and a
//! JSON config.
//!
//! Key concepts:
//! - `label_enum!` for typed labels
//! - Builder validation and prebuilt registration
//! - Cyclic labels: the same label is entered again on every cycle
//!
//! Run with: cargo run --example traffic_light

use flipflop::builder::MachineBuilder;
use flipflop::{label_enum, FlopConfig, Registry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

label_enum! {
    enum TrafficLight {
        Red,
        Green,
        Yellow,
    }
}

#[derive(Default, Clone)]
struct Timer {
    ticks: u32,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Traffic Light Machine ===\n");

    let config = FlopConfig::from_json(r#"{ "history_limit": 6 }"#).unwrap();
    let registry: Registry<Timer, TrafficLight> = Registry::with_config(config.clone());

    let machine = MachineBuilder::<Timer, TrafficLight>::new()
        .name("crossing")
        .config(config)
        .derive(|t: &Timer| match t.ticks % 6 {
            0..=2 => TrafficLight::Red,
            3 | 4 => TrafficLight::Green,
            _ => TrafficLight::Yellow,
        })
        .bind("tick", |t: &mut Timer, _: ()| t.ticks += 1)
        .on(TrafficLight::Red, |_: &Timer| println!("  Stop"))
        .on(TrafficLight::Green, |_: &Timer| println!("  Go"))
        .on(TrafficLight::Yellow, |_: &Timer| println!("  Caution"))
        .initial(Timer::default())
        .build()
        .unwrap();

    let light = registry.register(machine).unwrap();

    for _ in 0..12 {
        light.trigger("tick", ());
    }

    println!("\nLast {} labels:", config_limit(&registry));
    for label in light.history().get_path().into_iter().flatten() {
        println!("  {label}");
    }

    println!("\n=== Example Complete ===");
}

fn config_limit(registry: &Registry<Timer, TrafficLight>) -> usize {
    registry.config().history_limit
}
