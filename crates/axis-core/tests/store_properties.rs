//! Property tests for session transitions.

use std::cell::Cell;
use std::rc::Rc;

use axis_core::{AxisStore, Mode, SessionType};
use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Action {
    Start(SessionType),
    End,
    AutoEnd,
    SetMode(Mode),
    Undo,
    Advance(i64),
}

fn action() -> impl Strategy<Value = Action> {
    let session_type = prop::sample::select(SessionType::ALL.to_vec());
    let mode = prop_oneof![Just(Mode::Work), Just(Mode::Home)];
    prop_oneof![
        3 => session_type.prop_map(Action::Start),
        1 => Just(Action::End),
        1 => Just(Action::AutoEnd),
        1 => mode.prop_map(Action::SetMode),
        2 => Just(Action::Undo),
        2 => (0i64..120).prop_map(Action::Advance),
    ]
}

fn base() -> DateTime<Utc> {
    "2024-01-01T09:00:00Z".parse().unwrap()
}

proptest! {
    #[test]
    fn at_most_one_open_session(actions in prop::collection::vec(action(), 1..60)) {
        let clock = Rc::new(Cell::new(base()));
        let handle = clock.clone();
        let mut store = AxisStore::default().with_clock(move || handle.get());

        for action in actions {
            match action {
                Action::Start(t) => { store.start_session(t, None); }
                Action::End => { store.end_session(); }
                Action::AutoEnd => { store.auto_end_session(); }
                Action::SetMode(m) => { store.set_mode(m); }
                Action::Undo => { store.undo_last_action(); }
                Action::Advance(minutes) => clock.set(clock.get() + Duration::minutes(minutes)),
            }
            let state = store.state();
            let open = state.sessions.iter().filter(|s| s.end_time.is_none()).count();
            prop_assert!(open <= 1);
            prop_assert!(state.invariant_holds());
            for session in &state.sessions {
                if let Some(end) = session.end_time {
                    prop_assert!(end >= session.start_time);
                }
            }
        }
    }

    #[test]
    fn undo_restores_exact_snapshot(
        first in prop::sample::select(SessionType::ALL.to_vec()),
        second in prop::sample::select(SessionType::ALL.to_vec()),
        gap in 0i64..90,
    ) {
        let clock = Rc::new(Cell::new(base()));
        let handle = clock.clone();
        let mut store = AxisStore::default().with_clock(move || handle.get());

        store.start_session(first, None);
        let before_sessions = store.state().sessions.clone();
        let before_current = store.state().current_session_id.clone();

        clock.set(clock.get() + Duration::minutes(gap));
        store.start_session(second, None);

        prop_assert!(store.undo_last_action());
        prop_assert_eq!(&store.state().sessions, &before_sessions);
        prop_assert_eq!(&store.state().current_session_id, &before_current);
        prop_assert!(!store.undo_last_action());
    }
}
