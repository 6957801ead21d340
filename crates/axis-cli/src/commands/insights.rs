use axis_core::insights::{day_totals, weekly_summary};
use axis_core::time::format_duration_minutes;
use axis_core::Mode;
use chrono::{Local, Utc};
use clap::Subcommand;
use serde_json::json;

use super::{open_kv, open_store, print_json, today, CmdResult};

#[derive(Subcommand)]
pub enum InsightsAction {
    /// Today's focus and break totals
    Today {
        #[arg(long)]
        mode: Option<Mode>,
    },
    /// This week's summary (Monday start)
    Week {
        #[arg(long)]
        mode: Option<Mode>,
    },
}

pub fn run(action: InsightsAction) -> CmdResult {
    let store = open_store(&open_kv()?);
    let state = store.state();
    let now = Utc::now();

    match action {
        InsightsAction::Today { mode } => {
            let mode = mode.unwrap_or(state.mode);
            let totals = day_totals(&state.sessions, today(), mode, now, &Local);
            print_json(&json!({
                "mode": mode,
                "totals": totals,
                "focus": format_duration_minutes(totals.focus_minutes),
                "breaks": format_duration_minutes(totals.break_minutes),
            }))?;
        }
        InsightsAction::Week { mode } => {
            let mode = mode.unwrap_or(state.mode);
            let summary = weekly_summary(&state.sessions, &state.work_schedule, mode, now, &Local);
            print_json(&json!({
                "mode": mode,
                "summary": summary,
                "planned": format_duration_minutes(summary.planned_minutes),
                "focus": format_duration_minutes(summary.focus_minutes),
                "breaks": format_duration_minutes(summary.break_minutes),
            }))?;
        }
    }
    Ok(())
}
