//! Daily and weekly summaries derived from logged sessions.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Mode, Session, SessionType, WorkSchedule};
use crate::schedule::{is_lunch_required, work_day_range};
use crate::time::{local_date, MINUTE_MS};

/// Sessions of `mode` that started on `date` in `tz`.
pub fn sessions_for_day<'a, Tz: TimeZone>(
    sessions: &'a [Session],
    date: NaiveDate,
    mode: Mode,
    tz: &Tz,
) -> Vec<&'a Session> {
    sessions
        .iter()
        .filter(|s| s.mode == mode && local_date(s.start_time, tz) == date)
        .collect()
}

/// Elapsed minutes, rounded. A running session is measured up to `now`.
pub fn session_duration_minutes(session: &Session, now: DateTime<Utc>) -> i64 {
    let end = session.end_time.unwrap_or(now);
    let ms = (end - session.start_time).num_milliseconds();
    ((ms as f64 / MINUTE_MS as f64).round() as i64).max(0)
}

/// Human label, e.g. `short_break` becomes `"Short Break"`.
pub fn session_label(session_type: SessionType) -> String {
    session_type
        .as_str()
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTotals {
    pub focus_minutes: i64,
    pub break_minutes: i64,
    pub break_count: u32,
}

pub fn day_totals<Tz: TimeZone>(
    sessions: &[Session],
    date: NaiveDate,
    mode: Mode,
    now: DateTime<Utc>,
    tz: &Tz,
) -> DayTotals {
    let mut totals = DayTotals::default();
    for session in sessions_for_day(sessions, date, mode, tz) {
        let minutes = session_duration_minutes(session, now);
        if session.session_type.is_break() {
            totals.break_minutes += minutes;
            totals.break_count += 1;
        } else {
            totals.focus_minutes += minutes;
        }
    }
    totals
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub planned_minutes: i64,
    pub focus_minutes: i64,
    pub break_minutes: i64,
    pub lunch_required_days: u32,
    pub lunch_completed_days: u32,
    /// Percentage of lunch-required days with a logged lunch; 100 when
    /// no day required one.
    pub lunch_compliance: u32,
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Summary of the Monday-based week containing `now`.
///
/// Planned minutes and lunch compliance come from the work schedule and are
/// only computed in work mode.
pub fn weekly_summary<Tz: TimeZone>(
    sessions: &[Session],
    schedule: &[WorkSchedule],
    mode: Mode,
    now: DateTime<Utc>,
    tz: &Tz,
) -> WeeklySummary {
    let start = week_start(local_date(now, tz));
    let days: Vec<NaiveDate> = (0..7).map(|i| start + Duration::days(i)).collect();

    let mut focus_minutes = 0;
    let mut break_minutes = 0;
    for session in sessions.iter().filter(|s| s.mode == mode) {
        if !days.contains(&local_date(session.start_time, tz)) {
            continue;
        }
        let minutes = session_duration_minutes(session, now);
        if session.session_type == SessionType::Focus {
            focus_minutes += minutes;
        } else {
            break_minutes += minutes;
        }
    }

    let mut planned_minutes = 0;
    let mut lunch_required_days = 0;
    let mut lunch_completed_days = 0;
    if mode == Mode::Work {
        for day in &days {
            let Some(range) = work_day_range(*day, tz, schedule) else {
                continue;
            };
            let planned = range.planned_minutes();
            planned_minutes += planned;
            if !is_lunch_required(planned) {
                continue;
            }
            lunch_required_days += 1;
            let lunch_logged = sessions.iter().any(|s| {
                s.mode == Mode::Work
                    && s.session_type == SessionType::Lunch
                    && local_date(s.start_time, tz) == *day
            });
            if lunch_logged {
                lunch_completed_days += 1;
            }
        }
    }

    let lunch_compliance = if lunch_required_days == 0 {
        100
    } else {
        (lunch_completed_days as f64 / lunch_required_days as f64 * 100.0).round() as u32
    };

    WeeklySummary {
        week_start: start,
        planned_minutes,
        focus_minutes,
        break_minutes,
        lunch_required_days,
        lunch_completed_days,
        lunch_compliance,
    }
}
