//! Timer watchdog.
//!
//! Polled on a fixed interval while the app runs. For the running session
//! it enforces type-specific hard caps through
//! [`AxisStore::auto_end_session`] and emits one-shot nudges at elapsed
//! minute thresholds. Nothing runs in the background; the CLI `watch`
//! loop calls `tick()` once a second.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::events::Event;
use crate::models::SessionType;
use crate::store::AxisStore;
use crate::time::MINUTE_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nudge {
    pub minute: u32,
    pub message: &'static str,
}

const FOCUS_NUDGES: &[Nudge] = &[
    Nudge {
        minute: 50,
        message: "Focus interval complete.",
    },
    Nudge {
        minute: 75,
        message: "Focus interval extended.",
    },
];

const SHORT_BREAK_NUDGES: &[Nudge] = &[
    Nudge {
        minute: 10,
        message: "Break complete.",
    },
    Nudge {
        minute: 15,
        message: "Still on break?",
    },
];

const LUNCH_NUDGES: &[Nudge] = &[
    Nudge {
        minute: 45,
        message: "Lunch complete.",
    },
    Nudge {
        minute: 60,
        message: "Still on lunch?",
    },
];

pub fn nudge_thresholds(session_type: SessionType) -> &'static [Nudge] {
    match session_type {
        SessionType::Focus => FOCUS_NUDGES,
        SessionType::ShortBreak => SHORT_BREAK_NUDGES,
        SessionType::Lunch => LUNCH_NUDGES,
        SessionType::TaskBreak => &[],
    }
}

/// Elapsed minutes after which a session is closed automatically.
pub fn auto_end_minutes(session_type: SessionType) -> Option<u32> {
    match session_type {
        SessionType::TaskBreak => Some(3),
        SessionType::Lunch => Some(90),
        SessionType::Focus | SessionType::ShortBreak => None,
    }
}

/// Per-view watchdog state: the session being watched and which of its
/// nudges already fired (`"{session_id}:{minute}"`).
#[derive(Debug, Default)]
pub struct TimerWatchdog {
    watched_session: Option<String>,
    fired: HashSet<String>,
}

impl TimerWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fired_count(&self) -> usize {
        self.fired.len()
    }

    /// Run one check against the store.
    pub fn tick(&mut self, store: &mut AxisStore, now: DateTime<Utc>) -> Vec<Event> {
        let Some(session) = store.current_session() else {
            self.watched_session = None;
            self.fired.clear();
            return Vec::new();
        };
        let session_id = session.id.clone();
        let session_type = session.session_type;
        let elapsed_ms = (now - session.start_time).num_milliseconds();
        let elapsed_minutes = elapsed_ms as f64 / MINUTE_MS as f64;

        if self.watched_session.as_deref() != Some(session_id.as_str()) {
            self.fired.clear();
            self.watched_session = Some(session_id.clone());
        }

        if let Some(cap) = auto_end_minutes(session_type) {
            if elapsed_minutes >= cap as f64 {
                tracing::info!(session_id = %session_id, cap, "auto-ending session at cap");
                store.auto_end_session();
                return vec![Event::SessionAutoEnded {
                    session_id,
                    session_type,
                    cap_minutes: cap,
                    at: now,
                }];
            }
        }

        let mut events = Vec::new();
        for nudge in nudge_thresholds(session_type) {
            let key = format!("{session_id}:{}", nudge.minute);
            if elapsed_minutes >= nudge.minute as f64 && self.fired.insert(key) {
                events.push(Event::SessionNudge {
                    session_id: session_id.clone(),
                    session_type,
                    minute: nudge.minute,
                    message: nudge.message.to_string(),
                    at: now,
                });
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionSource;
    use chrono::Duration;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn store_at(start: &str) -> AxisStore {
        let start = at(start);
        AxisStore::default().with_clock(move || start)
    }

    #[test]
    fn idle_store_emits_nothing() {
        let mut store = AxisStore::default();
        let mut watchdog = TimerWatchdog::new();
        assert!(watchdog.tick(&mut store, Utc::now()).is_empty());
    }

    #[test]
    fn focus_nudges_fire_once_each() {
        let mut store = store_at("2024-01-01T09:00:00Z");
        store.start_session(SessionType::Focus, None);
        let start = at("2024-01-01T09:00:00Z");
        let mut watchdog = TimerWatchdog::new();

        assert!(watchdog.tick(&mut store, start + Duration::minutes(49)).is_empty());
        let events = watchdog.tick(&mut store, start + Duration::minutes(50));
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::SessionNudge { minute: 50, .. }));
        assert!(watchdog.tick(&mut store, start + Duration::minutes(51)).is_empty());

        let events = watchdog.tick(&mut store, start + Duration::minutes(80));
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::SessionNudge { minute: 75, .. }));
        assert_eq!(watchdog.fired_count(), 2);
    }

    #[test]
    fn late_first_tick_fires_all_passed_thresholds() {
        let mut store = store_at("2024-01-01T09:00:00Z");
        store.start_session(SessionType::ShortBreak, None);
        let mut watchdog = TimerWatchdog::new();
        let events = watchdog.tick(&mut store, at("2024-01-01T09:20:00Z"));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn task_break_is_capped_at_three_minutes() {
        let mut store = store_at("2024-01-01T09:00:00Z");
        store.start_session(SessionType::TaskBreak, None);
        let mut watchdog = TimerWatchdog::new();

        assert!(watchdog.tick(&mut store, at("2024-01-01T09:02:59Z")).is_empty());
        let events = watchdog.tick(&mut store, at("2024-01-01T09:03:00Z"));
        assert!(matches!(&events[0], Event::SessionAutoEnded { cap_minutes: 3, .. }));
        assert!(store.current_session().is_none());
        assert_eq!(store.state().sessions[0].source, SessionSource::AutoClosed);
        assert!(store.can_undo());
    }

    #[test]
    fn lunch_cap_preempts_nudges() {
        let mut store = store_at("2024-01-01T12:00:00Z");
        store.start_session(SessionType::Lunch, None);
        let mut watchdog = TimerWatchdog::new();
        let events = watchdog.tick(&mut store, at("2024-01-01T13:30:00Z"));
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::SessionAutoEnded { cap_minutes: 90, .. }));
    }

    #[test]
    fn fired_set_resets_when_session_changes() {
        let mut store = store_at("2024-01-01T09:00:00Z");
        store.start_session(SessionType::Focus, None);
        let mut watchdog = TimerWatchdog::new();
        watchdog.tick(&mut store, at("2024-01-01T09:55:00Z"));
        assert_eq!(watchdog.fired_count(), 1);

        store.start_session(SessionType::Focus, None);
        let events = watchdog.tick(&mut store, at("2024-01-01T09:55:00Z"));
        assert_eq!(events.len(), 1);
        assert_eq!(watchdog.fired_count(), 1);

        store.end_session();
        watchdog.tick(&mut store, at("2024-01-01T09:56:00Z"));
        assert_eq!(watchdog.fired_count(), 0);
    }
}
