//! Traffic Light State Machine
//!
//! This example demonstrates a cyclic, purely time-driven state machine.
//!
//! Key concepts:
//! - Timed transitions on a shared clock
//! - An explicit target closing the cycle
//! - Driving the machine from a fixed-rate loop
//!
//! Run with: cargo run --example traffic_light

use std::time::Duration;
use tickstate::builder::StateMachineBuilder;
use tickstate::state_key;
use tickstate::timing::FakeClock;

state_key! {
    enum TrafficLight {
        Red,
        Green,
        Yellow,
    }
}

fn main() {
    println!("=== Traffic Light State Machine ===\n");

    // Simulated time so the example finishes instantly.
    let clock = FakeClock::new();

    let mut machine = StateMachineBuilder::new()
        .clock(clock.shared())
        .state(TrafficLight::Red)
        .on_enter(|| println!("  Red    (Stop)"))
        .transition_timed(Duration::from_secs(4))
        .state(TrafficLight::Green)
        .on_enter(|| println!("  Green  (Go!)"))
        .transition_timed(Duration::from_secs(3))
        .state(TrafficLight::Yellow)
        .on_enter(|| println!("  Yellow (Caution)"))
        .transition_timed_to(Duration::from_secs(1), TrafficLight::Red)
        .build()
        .unwrap();

    println!("Transition sequence over 20 simulated seconds:");
    machine.start();
    for _ in 0..200 {
        machine.update().unwrap();
        clock.advance(Duration::from_millis(100));
    }

    println!("\nCompleted {} transitions", machine.history().len());
    println!("Current state: {}", machine.current_state_name());

    println!("\n=== Example Complete ===");
}
