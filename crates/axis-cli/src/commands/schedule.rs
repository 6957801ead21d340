//! Work schedule and break suggestion commands.

use axis_core::schedule::{next_suggestion, suggestions_for_day, work_day_range};
use axis_core::time::day_of_week;
use axis_core::WorkSchedule;
use chrono::{Local, NaiveDate, Utc};
use clap::Subcommand;
use serde_json::json;

use super::{open_kv, open_store, parse_date, print_json, signed_in_store, today, CmdResult};

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Print the weekly work schedule
    Show,
    /// Set or clear the work window for one day of the week
    Set {
        /// Day of week, 0 = Sunday ... 6 = Saturday
        #[arg(value_parser = clap::value_parser!(u8).range(0..7))]
        day: u8,
        /// Window start (HH:MM)
        #[arg(required_unless_present = "off")]
        start: Option<String>,
        /// Window end (HH:MM)
        #[arg(required_unless_present = "off")]
        end: Option<String>,
        /// Make the day a non-working day
        #[arg(long, conflicts_with_all = ["start", "end"])]
        off: bool,
    },
    /// Suggested breaks and lunch for a day
    Suggest {
        /// Day to plan (YYYY-MM-DD, default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// The next suggested break from now
    Next,
}

pub fn run(action: ScheduleAction) -> CmdResult {
    match action {
        ScheduleAction::Show => {
            let store = open_store(&open_kv()?);
            let mut entries = store.state().work_schedule.clone();
            entries.sort_by_key(|e| e.day_of_week);
            let rows: Vec<_> = entries
                .iter()
                .map(|e| {
                    json!({
                        "day": DAY_NAMES.get(e.day_of_week as usize).copied().unwrap_or("?"),
                        "dayOfWeek": e.day_of_week,
                        "start": e.start,
                        "end": e.end,
                    })
                })
                .collect();
            print_json(&rows)?;
        }
        ScheduleAction::Set {
            day,
            start,
            end,
            off,
        } => {
            let mut store = signed_in_store()?;
            let mut schedule: Vec<WorkSchedule> = store
                .state()
                .work_schedule
                .iter()
                .filter(|e| e.day_of_week != day)
                .cloned()
                .collect();
            if !off {
                let (Some(start), Some(end)) = (start, end) else {
                    return Err("both start and end are required".into());
                };
                schedule.push(WorkSchedule::new(day, &start, &end));
            }
            schedule.sort_by_key(|e| e.day_of_week);
            store.set_work_schedule(schedule)?;
            print_json(&store.state().work_schedule)?;
        }
        ScheduleAction::Suggest { date } => {
            let store = open_store(&open_kv()?);
            let date = date.unwrap_or_else(today);
            let state = store.state();
            let window = work_day_range(date, &Local, &state.work_schedule);
            print_json(&json!({
                "date": date,
                "dayOfWeek": day_of_week(date),
                "window": window,
                "plannedMinutes": window.map(|w| w.planned_minutes()).unwrap_or(0),
                "suggestions": suggestions_for_day(state, date, &Local),
            }))?;
        }
        ScheduleAction::Next => {
            let store = open_store(&open_kv()?);
            print_json(&next_suggestion(store.state(), Utc::now(), &Local))?;
        }
    }
    Ok(())
}
