use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::insights::session_label;
use crate::models::SessionType;

/// Advisory output of the watchdog and reminder checks.
/// Callers forward these to a notifier; nothing waits on delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// One-shot nudge at an elapsed-minute threshold.
    SessionNudge {
        session_id: String,
        session_type: SessionType,
        minute: u32,
        message: String,
        at: DateTime<Utc>,
    },
    /// The watchdog closed a session that hit its hard cap.
    SessionAutoEnded {
        session_id: String,
        session_type: SessionType,
        cap_minutes: u32,
        at: DateTime<Utc>,
    },
    /// The running session reached its planned duration.
    SessionFinished {
        session_id: String,
        session_type: SessionType,
        at: DateTime<Utc>,
    },
    /// A busy block is about to start.
    BusyBlockUpcoming {
        block_id: String,
        title: String,
        starts_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Title and body for a desktop-style notification.
    pub fn notification(&self) -> (String, String) {
        match self {
            Event::SessionNudge {
                session_type,
                message,
                ..
            } => (session_label(*session_type), message.clone()),
            Event::SessionAutoEnded {
                session_type,
                cap_minutes,
                ..
            } => (
                format!("{} ended", session_label(*session_type)),
                format!("Closed automatically after {cap_minutes} minutes."),
            ),
            Event::SessionFinished { session_type, .. } => (
                format!("{} Finished", session_label(*session_type)),
                "Time to take a break or switch tasks!".to_string(),
            ),
            Event::BusyBlockUpcoming {
                title, starts_at, ..
            } => (
                format!("Upcoming: {title}"),
                format!("Starting at {}", starts_at.format("%H:%M UTC")),
            ),
        }
    }
}
