//! Property-based tests for the engine.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated graphs.

use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tickstate::builder::StateMachineBuilder;
use tickstate::core::StateId;
use tickstate::timing::FakeClock;
use tickstate::{MachineError, State, StateMachine, Transition};

fn chain(len: usize) -> Vec<State> {
    (0..len)
        .map(|i| {
            let state = State::new(format!("S{i}"));
            if i + 1 < len {
                state.transition(Transition::when(|| true))
            } else {
                state.on_loop(|| {})
            }
        })
        .collect()
}

prop_compose! {
    fn arbitrary_pools()(flags in prop::collection::vec(any::<bool>(), 1..12)) -> Vec<bool> {
        // At least one linear state so the graph can start.
        let mut flags = flags;
        let last = flags.len() - 1;
        flags[last] = false;
        flags
    }
}

proptest! {
    #[test]
    fn construction_starts_at_first_linear_state(fallback in arbitrary_pools()) {
        let states: Vec<State> = fallback
            .iter()
            .enumerate()
            .map(|(i, &is_fallback)| {
                let state = State::new(format!("S{i}"));
                if is_fallback { state.into_fallback() } else { state }
            })
            .collect();
        let first_linear = fallback.iter().position(|f| !f).unwrap();

        let machine = StateMachine::new(states).unwrap();

        prop_assert_eq!(machine.current_state_name(), format!("S{first_linear}"));
    }

    #[test]
    fn default_transitions_follow_declaration_order(len in 1usize..10) {
        let mut machine = StateMachine::new(chain(len)).unwrap();
        machine.start();

        for _ in 0..len {
            machine.update().unwrap();
        }

        let expected: Vec<String> = (0..len).map(|i| format!("S{i}")).collect();
        let path: Vec<String> = machine.history().get_path().iter().map(|id| id.to_string()).collect();
        if len > 1 {
            prop_assert_eq!(path, expected);
        } else {
            prop_assert!(path.is_empty());
        }
        prop_assert_eq!(machine.current_state_name(), format!("S{}", len - 1));
    }

    #[test]
    fn first_ready_transition_wins(ready in prop::collection::vec(any::<bool>(), 1..8)) {
        let mut source = State::new("Source");
        for (i, &is_ready) in ready.iter().enumerate() {
            source = source.transition(Transition::when(move || is_ready).to(format!("T{i}")));
        }
        let mut states = vec![source];
        for i in 0..ready.len() {
            states.push(State::new(format!("T{i}")).on_loop(|| {}));
        }

        let mut machine = StateMachine::new(states).unwrap();
        machine.start();
        machine.update().unwrap();

        match ready.iter().position(|&r| r) {
            Some(winner) => prop_assert_eq!(machine.current_state_name(), format!("T{winner}")),
            None => prop_assert_eq!(machine.current_state_name(), "Source"),
        }
    }

    #[test]
    fn deferred_callbacks_fire_once_in_ascending_order(
        delays in prop::collection::vec(0u64..20, 1..8)
    ) {
        let clock = FakeClock::new();
        let fired = Arc::new(Mutex::new(Vec::new()));
        let mut builder = StateMachineBuilder::new().clock(clock.shared()).state("Sequence");
        for &delay in &delays {
            let fired = Arc::clone(&fired);
            builder = builder.after(Duration::from_secs(delay), move || fired.lock().unwrap().push(delay));
        }
        let mut machine = builder.on_loop(|| {}).build().unwrap();

        machine.start();
        for _ in 0..25 {
            machine.update().unwrap();
            clock.advance(Duration::from_secs(1));
        }

        let mut expected = delays.clone();
        expected.sort_unstable();
        prop_assert_eq!(fired.lock().unwrap().clone(), expected);
    }

    #[test]
    fn reset_returns_to_first_state(len in 2usize..8, steps in 0usize..8) {
        let mut machine = StateMachine::new(chain(len)).unwrap();
        machine.start();
        for _ in 0..steps {
            machine.update().unwrap();
        }

        machine.stop();
        machine.reset();

        prop_assert_eq!(machine.current_state_name(), "S0");
        prop_assert!(machine.is_running());
    }

    #[test]
    fn unknown_names_are_invalid(name in "[a-z]{1,8}") {
        let mut machine = StateMachine::new(vec![State::new("KNOWN")]).unwrap();
        prop_assert_eq!(
            machine.set_state(name.as_str()),
            Err(MachineError::InvalidState { name: StateId::named(name.as_str()) })
        );
    }
}
