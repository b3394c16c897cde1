//! Integration tests for the control engine
//!
//! These tests drive an engine over a simulated rig and check:
//! - Lifecycle (start, stop, idempotent shutdown)
//! - Ordering of backend calls within a request
//! - One outcome per command, and failure isolation
//! - Poll debouncing

use std::time::Duration;

use rig_control::{
    Engine, EngineStatus, Immediate, Notification, PollingDebouncer, StateUpdate,
    POLLS_TO_STABILIZE,
};
use rig_protocol::{Mode, RadioState};
use rig_sim::{BackendCall, CallKind, SimHandle, SimulatedRig, SimulatedRigConfig};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// Engine over a default simulated rig, no settle delay
    pub fn engine() -> (Engine<SimulatedRig>, SimHandle) {
        let (rig, handle) = SimulatedRig::new(SimulatedRigConfig::default());
        (
            Engine::new(rig, Immediate).with_settle_delay(Duration::ZERO),
            handle,
        )
    }

    /// Engine already started, with the journal and events cleared
    pub fn online_engine() -> (Engine<SimulatedRig>, SimHandle) {
        let (mut engine, handle) = engine();
        engine.start(1);
        engine.drain_events();
        handle.clear_calls();
        (engine, handle)
    }

    /// Engine with the polling debouncer
    pub fn polled_engine() -> (Engine<SimulatedRig, PollingDebouncer>, SimHandle) {
        let (rig, handle) = SimulatedRig::new(SimulatedRigConfig::default());
        let policy = PollingDebouncer::new(Duration::from_millis(100));
        (
            Engine::new(rig, policy).with_settle_delay(Duration::ZERO),
            handle,
        )
    }

    /// State updates among notifications
    pub fn updates(events: &[Notification]) -> Vec<StateUpdate> {
        events.iter().filter_map(|n| n.as_update().copied()).collect()
    }

    /// Notifications that complete a command
    pub fn outcomes(events: &[Notification]) -> usize {
        events
            .iter()
            .filter(|n| !matches!(n, Notification::Resolution { .. }))
            .count()
    }
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn stop_while_offline_is_idempotent() {
        let (mut engine, handle) = helpers::engine();

        engine.stop(1);
        engine.stop(2);

        assert!(handle.calls().is_empty());
        assert_eq!(engine.status(), EngineStatus::Offline);
        assert_eq!(helpers::outcomes(&engine.drain_events()), 2);
    }

    #[test]
    fn stop_after_stop_touches_nothing() {
        let (mut engine, handle) = helpers::online_engine();

        engine.stop(2);
        handle.clear_calls();
        engine.stop(3);

        assert!(handle.calls().is_empty());
    }

    #[test]
    fn restart_stops_first() {
        let (mut engine, handle) = helpers::online_engine();

        engine.start(2);

        assert_eq!(
            handle.commands(),
            vec![
                BackendCall::SetPtt { on: false },
                BackendCall::Stop,
                BackendCall::Start
            ]
        );
        assert_eq!(engine.status(), EngineStatus::Online);
    }

    #[test]
    fn scenario_tune_key_and_stop() {
        let (mut engine, handle) = helpers::engine();

        engine.start(1);
        engine.set(&RadioState::tuned(7_074_000, Mode::Usb), 2);
        engine.set(&RadioState::tuned(7_074_000, Mode::Usb).with_ptt(true), 3);
        engine.stop(4);

        assert_eq!(
            handle.calls(),
            vec![
                BackendCall::Start,
                BackendCall::SetFrequency {
                    hz: 7_074_000,
                    mode: Mode::Usb,
                    allow_immediate: false
                },
                BackendCall::SetPtt { on: true },
                BackendCall::SetPtt { on: false },
                BackendCall::Stop,
            ]
        );

        let events = engine.drain_events();
        let updates = helpers::updates(&events);
        assert_eq!(
            updates.iter().map(|u| u.sequence).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(
            updates[1].state,
            RadioState::tuned(7_074_000, Mode::Usb)
        );
        assert!(updates[2].state.ptt);
        assert_eq!(events.last(), Some(&Notification::Finished { sequence: 4 }));
    }
}

// ============================================================================
// Ordering Tests
// ============================================================================

mod ordering_tests {
    use super::*;

    #[test]
    fn ptt_on_comes_after_frequency() {
        let (mut engine, handle) = helpers::online_engine();

        engine.set(
            &RadioState::tuned(3_573_000, Mode::Unknown).with_ptt(true),
            2,
        );

        let calls = handle.calls();
        assert!(calls[0].is_frequency());
        assert_eq!(calls.last(), Some(&BackendCall::SetPtt { on: true }));
    }

    #[test]
    fn ptt_off_comes_before_frequency() {
        let (mut engine, handle) = helpers::online_engine();
        engine.set(&RadioState::tuned(14_074_000, Mode::Usb).with_ptt(true), 2);
        handle.clear_calls();

        engine.set(&RadioState::tuned(3_573_000, Mode::Usb), 3);

        let calls = handle.calls();
        assert_eq!(calls[0], BackendCall::SetPtt { on: false });
        assert!(matches!(
            calls[1],
            BackendCall::SetFrequency {
                allow_immediate: true,
                ..
            }
        ));
    }

    #[test]
    fn split_set_and_cleared() {
        let (mut engine, handle) = helpers::online_engine();

        engine.set(
            &RadioState::tuned(14_074_000, Mode::Usb).with_tx_frequency(14_075_500),
            2,
        );
        assert!(engine.state().split);

        engine.set(&RadioState::tuned(14_074_000, Mode::Usb), 3);
        assert!(!engine.state().split);
        assert_eq!(
            handle.calls().last(),
            Some(&BackendCall::SetTxFrequency {
                hz: 0,
                mode: Mode::Usb,
                allow_immediate: false
            })
        );
    }

    #[test]
    fn rig_rounding_is_reported() {
        let config = SimulatedRigConfig {
            resolution: rig_protocol::Resolution::Hz10Rounded,
            ..Default::default()
        };
        let (rig, _handle) = SimulatedRig::new(config);
        let mut engine = Engine::new(rig, Immediate).with_settle_delay(Duration::ZERO);
        engine.start(1);

        engine.set(&RadioState::tuned(7_074_006, Mode::Usb), 2);

        let updates = helpers::updates(&engine.drain_events());
        assert_eq!(updates.last().map(|u| u.state.frequency), Some(7_074_010));
    }
}

// ============================================================================
// Failure Tests
// ============================================================================

mod failure_tests {
    use super::*;

    #[test]
    fn failing_ptt_aborts_remaining_steps() {
        let (mut engine, handle) = helpers::online_engine();
        handle.fail_next(CallKind::SetPtt, "no ack");

        engine.set(&RadioState::tuned(7_074_000, Mode::Usb).with_ptt(true), 2);

        let events = engine.drain_events();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_failure());
        assert_eq!(engine.status(), EngineStatus::Failed);
        // Keying failed after tuning; shutdown still tried to unkey
        assert_eq!(
            handle.commands(),
            vec![
                BackendCall::SetFrequency {
                    hz: 7_074_000,
                    mode: Mode::Usb,
                    allow_immediate: false
                },
                BackendCall::SetPtt { on: true },
                BackendCall::SetPtt { on: false },
                BackendCall::Stop,
            ]
        );
    }

    #[test]
    fn failed_engine_ignores_polls_and_stops_quietly() {
        let (mut engine, handle) = helpers::online_engine();
        handle.fail_next(CallKind::SetFrequency, "out of band");
        engine.set(&RadioState::tuned(50_313_000, Mode::Usb), 2);
        engine.drain_events();
        handle.clear_calls();

        engine.poll_tick();
        engine.stop(3);

        assert!(handle.calls().is_empty());
        assert_eq!(
            engine.drain_events(),
            vec![Notification::Finished { sequence: 3 }]
        );
    }
}

// ============================================================================
// Debounce Tests
// ============================================================================

mod debounce_tests {
    use super::*;

    #[test]
    fn silent_rig_signalled_after_bounded_polls() {
        let (mut engine, handle) = helpers::polled_engine();
        engine.start(1);
        for _ in 0..POLLS_TO_STABILIZE {
            engine.poll_tick();
        }
        engine.drain_events();
        handle.set_unresponsive(true);

        engine.set(&RadioState::tuned(21_074_000, Mode::Usb), 2);
        engine.drain_events();

        let mut polls = 0;
        loop {
            engine.poll_tick();
            polls += 1;
            if !helpers::updates(&engine.drain_events()).is_empty() {
                break;
            }
            assert!(polls < POLLS_TO_STABILIZE, "no signal after {} polls", polls);
        }
        assert_eq!(polls, POLLS_TO_STABILIZE);
    }

    #[test]
    fn unchanged_polls_stay_quiet() {
        let (mut engine, _handle) = helpers::polled_engine();
        engine.start(1);
        for _ in 0..POLLS_TO_STABILIZE {
            engine.poll_tick();
        }
        engine.drain_events();

        for _ in 0..10 {
            engine.poll_tick();
        }
        assert!(engine.drain_events().is_empty());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Action {
        Set(RadioState),
        Poll,
        Stop,
        Start,
    }

    // Frequencies around the 40m and 20m FT8 spots, plus "unspecified"
    fn frequency() -> impl Strategy<Value = u64> {
        prop_oneof![
            Just(0u64),
            7_070_000u64..7_080_000u64,
            14_070_000u64..14_080_000u64,
        ]
    }

    fn mode() -> impl Strategy<Value = Mode> {
        prop::sample::select(vec![Mode::Unknown, Mode::Usb, Mode::Lsb, Mode::Cw, Mode::DigU])
    }

    fn state() -> impl Strategy<Value = RadioState> {
        (
            any::<bool>(),
            frequency(),
            prop_oneof![Just(0u64), 14_070_000u64..14_080_000u64],
            mode(),
            any::<bool>(),
        )
            .prop_map(|(online, frequency, tx, mode, ptt)| RadioState {
                online,
                frequency,
                mode,
                ptt,
                ..Default::default()
            }
            .with_tx_frequency(tx))
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            6 => state().prop_map(Action::Set),
            2 => Just(Action::Poll),
            1 => Just(Action::Stop),
            1 => Just(Action::Start),
        ]
    }

    proptest! {
        #[test]
        fn one_outcome_per_command_and_sequences_ascend(actions in prop::collection::vec(action(), 1..30)) {
            let (mut engine, _handle) = helpers::engine();
            let mut sequence = 0u64;
            let mut last_seen = 0u64;

            for action in actions {
                let command = !matches!(action, Action::Poll);
                match action {
                    Action::Set(desired) => {
                        sequence += 1;
                        engine.set(&desired, sequence);
                    }
                    Action::Start => {
                        sequence += 1;
                        engine.start(sequence);
                    }
                    Action::Stop => {
                        sequence += 1;
                        engine.stop(sequence);
                    }
                    Action::Poll => engine.poll_tick(),
                }

                let events = engine.drain_events();
                if command {
                    prop_assert_eq!(helpers::outcomes(&events), 1);
                }
                for update in helpers::updates(&events) {
                    prop_assert!(update.sequence >= last_seen);
                    prop_assert!(update.sequence <= sequence);
                    last_seen = update.sequence;
                }
            }
        }

        #[test]
        fn zero_frequency_never_retunes(mut desired in state()) {
            let (mut engine, handle) = helpers::online_engine();
            desired.frequency = 0;

            engine.set(&desired, 2);

            prop_assert!(!handle
                .calls()
                .iter()
                .any(|c| c.kind() == CallKind::SetFrequency));
        }

        #[test]
        fn ptt_on_last_and_ptt_off_first(first in state(), second in state()) {
            let (mut engine, handle) = helpers::online_engine();
            engine.set(&RadioState { online: true, ..first }, 2);
            handle.clear_calls();

            engine.set(&RadioState { online: true, ..second }, 3);

            let calls = handle.calls();
            for (i, call) in calls.iter().enumerate() {
                match call {
                    BackendCall::SetPtt { on: true } => prop_assert_eq!(i, calls.len() - 1),
                    BackendCall::SetPtt { on: false } => prop_assert_eq!(i, 0),
                    _ => {}
                }
            }
        }
    }
}
