//! Break and lunch suggestions for a work day.
//!
//! Given the recurring work-schedule table and the day's busy blocks, this
//! module places evenly spaced short breaks and a midday lunch inside the
//! work-day window without overlapping any block:
//! - Resolves the day's window from the schedule by day of week
//! - Derives the break count and lunch requirement from the planned length
//! - Nudges each ideal slot around conflicts, or drops it
//!
//! Everything here is a pure function of its inputs.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{BusyBlock, Mode, SessionType, WorkSchedule};
use crate::store::AxisState;
use crate::time::{day_of_week, local_date, parse_time_to_minutes, MINUTE_MS};

/// Symmetric probe offsets (minutes) tried around a blocked target, earlier first.
const PROBE_OFFSETS: [i64; 4] = [5, 10, 15, 20];

const LUNCH_THRESHOLD_MIN: i64 = 360;

/// A resolved `[start, end)` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Window length in whole minutes, rounded.
    pub fn planned_minutes(&self) -> i64 {
        let ms = (self.end - self.start).num_milliseconds();
        (ms as f64 / MINUTE_MS as f64).round() as i64
    }

    pub fn contains(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start >= self.start && end <= self.end
    }
}

/// A computed, non-persisted break or lunch placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedSession {
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: u32,
}

impl SuggestedSession {
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(self.duration_minutes as i64)
    }
}

/// Inputs to [`generate_suggestions`].
#[derive(Debug, Clone, Copy)]
pub struct SuggestionInput<'a> {
    pub date: NaiveDate,
    pub schedule: &'a [WorkSchedule],
    pub busy_blocks: &'a [BusyBlock],
    pub short_break_minutes: u32,
    pub lunch_minutes: u32,
}

/// Resolve the work-day window for `date` in `tz`.
///
/// Returns `None` when no entry matches the day of week, when an entry has
/// an unreadable clock string, or when a local time does not exist.
pub fn work_day_range<Tz: TimeZone>(
    date: NaiveDate,
    tz: &Tz,
    schedule: &[WorkSchedule],
) -> Option<TimeRange> {
    let weekday = day_of_week(date);
    let entry = schedule.iter().find(|item| item.day_of_week == weekday)?;

    let parse = |clock: &str| match parse_time_to_minutes(clock) {
        Ok(minutes) => Some(minutes),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring work schedule entry");
            None
        }
    };
    let start = local_instant(date, parse(&entry.start)?, tz)?;
    let end = local_instant(date, parse(&entry.end)?, tz)?;
    Some(TimeRange { start, end })
}

fn local_instant<Tz: TimeZone>(date: NaiveDate, minutes: u32, tz: &Tz) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    let local = midnight + Duration::minutes(minutes as i64);
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn is_lunch_required(planned_minutes: i64) -> bool {
    planned_minutes >= LUNCH_THRESHOLD_MIN
}

pub fn short_break_count(planned_minutes: i64) -> u32 {
    match planned_minutes {
        m if m >= 570 => 3,
        m if m >= 480 => 2,
        m if m >= 240 => 1,
        _ => 0,
    }
}

/// Find a start time near `target` for a slot of `duration_minutes`.
///
/// Precedence: the exact target, then `target ∓ 5, 10, 15, 20` minutes
/// (earlier before later at each step), then a forward sweep that pushes
/// the candidate past every busy block it overlaps in start order. The
/// sweep result is only accepted if it still lies inside `day`.
pub fn find_available_time(
    target: DateTime<Utc>,
    duration_minutes: u32,
    busy_blocks: &[BusyBlock],
    day: TimeRange,
) -> Option<DateTime<Utc>> {
    let duration = Duration::minutes(duration_minutes as i64);
    let is_valid = |candidate: DateTime<Utc>| {
        let end = candidate + duration;
        day.contains(candidate, end) && !busy_blocks.iter().any(|b| b.overlaps(candidate, end))
    };

    if is_valid(target) {
        return Some(target);
    }

    for offset in PROBE_OFFSETS {
        let earlier = target - Duration::minutes(offset);
        if is_valid(earlier) {
            return Some(earlier);
        }
        let later = target + Duration::minutes(offset);
        if is_valid(later) {
            return Some(later);
        }
    }

    let mut sorted: Vec<&BusyBlock> = busy_blocks.iter().collect();
    sorted.sort_by_key(|b| b.start_time);
    let mut candidate = target;
    for block in sorted {
        if block.overlaps(candidate, candidate + duration) {
            candidate = block.end_time;
        }
    }

    is_valid(candidate).then_some(candidate)
}

/// Place the day's short breaks and lunch.
///
/// Suggestions that cannot be placed are left out. The result is sorted by
/// start time.
pub fn generate_suggestions<Tz: TimeZone>(
    input: &SuggestionInput<'_>,
    tz: &Tz,
) -> Vec<SuggestedSession> {
    // 1. Resolve the window
    let Some(range) = work_day_range(input.date, tz, input.schedule) else {
        return Vec::new();
    };

    // 2. Size the day
    let planned_minutes = range.planned_minutes();
    let break_count = short_break_count(planned_minutes);
    let lunch_required = is_lunch_required(planned_minutes);
    let planned_ms = planned_minutes * MINUTE_MS;

    let mut suggestions = Vec::new();

    // 3. Evenly spaced short breaks
    for index in 1..=break_count as i64 {
        let offset_ms = planned_ms * index / (break_count as i64 + 1);
        let target = range.start + Duration::milliseconds(offset_ms);
        match find_available_time(target, input.short_break_minutes, input.busy_blocks, range) {
            Some(start_time) => suggestions.push(SuggestedSession {
                session_type: SessionType::ShortBreak,
                start_time,
                duration_minutes: input.short_break_minutes,
            }),
            None => tracing::debug!(%target, "no slot for short break"),
        }
    }

    // 4. Lunch at the midpoint
    if lunch_required {
        let target = range.start + Duration::milliseconds(planned_ms / 2);
        match find_available_time(target, input.lunch_minutes, input.busy_blocks, range) {
            Some(start_time) => suggestions.push(SuggestedSession {
                session_type: SessionType::Lunch,
                start_time,
                duration_minutes: input.lunch_minutes,
            }),
            None => tracing::debug!(%target, "no slot for lunch"),
        }
    }

    suggestions.sort_by_key(|s| s.start_time);
    suggestions
}

/// Busy blocks whose start falls on `date` in `tz`.
pub fn blocks_on_day<Tz: TimeZone>(blocks: &[BusyBlock], date: NaiveDate, tz: &Tz) -> Vec<BusyBlock> {
    blocks
        .iter()
        .filter(|b| local_date(b.start_time, tz) == date)
        .cloned()
        .collect()
}

/// Suggestions for `date` using the store's schedule, same-day busy blocks
/// and work-mode durations.
pub fn suggestions_for_day<Tz: TimeZone>(
    state: &AxisState,
    date: NaiveDate,
    tz: &Tz,
) -> Vec<SuggestedSession> {
    let blocks = blocks_on_day(&state.busy_blocks, date, tz);
    let settings = state.settings.work;
    let input = SuggestionInput {
        date,
        schedule: &state.work_schedule,
        busy_blocks: &blocks,
        short_break_minutes: settings.short_break_minutes,
        lunch_minutes: settings.lunch_minutes,
    };
    generate_suggestions(&input, tz)
}

/// The upcoming-break hint: first suggestion starting at or after `now`.
///
/// Only produced in work mode.
pub fn next_suggestion<Tz: TimeZone>(
    state: &AxisState,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Option<SuggestedSession> {
    if state.mode != Mode::Work {
        return None;
    }
    suggestions_for_day(state, local_date(now, tz), tz)
        .into_iter()
        .find(|s| s.start_time >= now)
}
