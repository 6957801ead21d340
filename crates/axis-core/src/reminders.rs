//! Reminders for upcoming busy blocks and finished sessions.
//!
//! Each reminder fires at most once per key: `block-{id}` for busy
//! blocks, `session-end-{id}` for sessions. A key is forgotten once its
//! block has started or been deleted, or its session is no longer
//! running. The caller polls [`ReminderManager::check`] and hands the
//! events to a [`Notifier`].

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::events::Event;
use crate::store::AxisState;
use crate::time::MINUTE_MS;

/// Minutes before a busy block starts at which its reminder fires.
pub const DEFAULT_LEAD_MINUTES: u32 = 5;

/// Delivery seam for notifications. Implementations must not block.
pub trait Notifier {
    fn notify(&self, title: &str, body: &str);
}

/// Notifier that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _title: &str, _body: &str) {}
}

/// Send every event through `notifier`.
pub fn deliver(notifier: &dyn Notifier, events: &[Event]) {
    for event in events {
        let (title, body) = event.notification();
        notifier.notify(&title, &body);
    }
}

#[derive(Debug)]
pub struct ReminderManager {
    notified: HashSet<String>,
    lead_minutes: u32,
}

impl Default for ReminderManager {
    fn default() -> Self {
        Self::new(DEFAULT_LEAD_MINUTES)
    }
}

impl ReminderManager {
    pub fn new(lead_minutes: u32) -> Self {
        Self {
            notified: HashSet::new(),
            lead_minutes: lead_minutes.max(1),
        }
    }

    pub fn lead_minutes(&self) -> u32 {
        self.lead_minutes
    }

    pub fn notified_count(&self) -> usize {
        self.notified.len()
    }

    /// Collect reminders due at `now`.
    ///
    /// A busy block is due while its start is in the one-minute window
    /// `(lead - 1, lead]` minutes away. A running session is due once
    /// `now` reaches its start plus its intended minutes.
    pub fn check(&mut self, state: &AxisState, now: DateTime<Utc>) -> Vec<Event> {
        self.forget_stale(state, now);
        let mut events = Vec::new();
        let lead_ms = self.lead_minutes as i64 * MINUTE_MS;

        for block in &state.busy_blocks {
            let until_ms = (block.start_time - now).num_milliseconds();
            if until_ms > lead_ms || until_ms <= lead_ms - MINUTE_MS {
                continue;
            }
            if self.notified.insert(format!("block-{}", block.id)) {
                tracing::debug!(block_id = %block.id, "busy block reminder");
                events.push(Event::BusyBlockUpcoming {
                    block_id: block.id.clone(),
                    title: block.title.clone(),
                    starts_at: block.start_time,
                    at: now,
                });
            }
        }

        if let Some(session) = state.current_session() {
            let due = session.start_time + Duration::minutes(session.intended_minutes as i64);
            if session.intended_minutes > 0
                && now >= due
                && self.notified.insert(format!("session-end-{}", session.id))
            {
                tracing::debug!(session_id = %session.id, "session finished reminder");
                events.push(Event::SessionFinished {
                    session_id: session.id.clone(),
                    session_type: session.session_type,
                    at: now,
                });
            }
        }

        events
    }

    fn forget_stale(&mut self, state: &AxisState, now: DateTime<Utc>) {
        let live: HashSet<String> = state
            .busy_blocks
            .iter()
            .filter(|block| block.start_time > now)
            .map(|block| format!("block-{}", block.id))
            .chain(
                state
                    .current_session()
                    .map(|session| format!("session-end-{}", session.id)),
            )
            .collect();
        self.notified.retain(|key| live.contains(key));
    }
}
