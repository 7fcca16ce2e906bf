//! Intake Cycle
//!
//! A robot intake driven from a 50 Hz control loop.
//!
//! Key concepts:
//! - Sensor-driven transitions with exit-action overrides
//! - Minimum dwell time before leaving a state
//! - Deferred one-shot callbacks
//! - A fallback state reached only when a jam is detected
//!
//! Run with: cargo run --example intake_cycle

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tickstate::builder::StateMachineBuilder;
use tickstate::state_key;
use tickstate::timing::FakeClock;

state_key! {
    enum Intake {
        Extend,
        Grab,
        Retract,
        Transfer,
        Jammed,
    }
}

fn main() {
    println!("=== Intake Cycle ===\n");

    let clock = FakeClock::new();
    // Simulated sensor: counts loop iterations since start.
    let loop_count = Arc::new(AtomicU32::new(0));

    let touched = Arc::clone(&loop_count);
    let counter = Arc::clone(&loop_count);

    let mut machine = StateMachineBuilder::new()
        .clock(clock.shared())
        .every_tick(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .state(Intake::Extend)
        .on_enter(|| println!("[Extend]   slides out"))
        .transition(move || touched.load(Ordering::SeqCst) > 20)
        .state(Intake::Grab)
        .on_enter(|| println!("[Grab]     closing claw"))
        .after(Duration::from_millis(100), || println!("[Grab]     claw closed"))
        .min_time(Duration::from_millis(300))
        .transition_timed_to(Duration::from_secs(2), Intake::Jammed)
        .transition_with_exit(|| true, || println!("[Grab]     piece secured"))
        .state(Intake::Retract)
        .on_enter(|| println!("[Retract]  slides in"))
        .transition_timed(Duration::from_millis(500))
        .state(Intake::Transfer)
        .on_enter(|| println!("[Transfer] handing off"))
        .fallback_state(Intake::Jammed)
        .on_enter(|| println!("[Jammed]   reversing rollers"))
        .transition_timed_to(Duration::from_secs(1), Intake::Extend)
        .build_checked()
        .unwrap();

    machine.start();
    while machine.is_running() {
        machine.update().unwrap();
        clock.advance(Duration::from_millis(20));
    }

    println!("\nFinished in {} ticks", machine.ticks());
    for change in machine.history().changes() {
        println!("  tick {:>3}: {} -> {}", change.tick, change.from, change.to);
    }

    println!("\n=== Example Complete ===");
}
