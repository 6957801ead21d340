use axis_core::time::format_duration_minutes;
use chrono::Utc;
use clap::Subcommand;
use serde_json::json;

use super::{print_json, signed_in_store, CmdResult};

#[derive(Subcommand)]
pub enum ShiftAction {
    /// Clock in (no-op if already clocked in)
    In,
    /// Clock out of the open shift
    Out,
    /// Print the open shift
    Status,
}

pub fn run(action: ShiftAction) -> CmdResult {
    let mut store = signed_in_store()?;

    match action {
        ShiftAction::In => {
            let started = store.clock_in();
            print_json(&json!({
                "type": "clocked_in",
                "changed": started.is_some(),
                "shift": store.state().current_shift(),
            }))?;
        }
        ShiftAction::Out => {
            let changed = store.clock_out();
            print_json(&json!({ "type": "clocked_out", "changed": changed }))?;
        }
        ShiftAction::Status => {
            let shift = store.state().current_shift();
            let elapsed = shift.map(|s| (Utc::now() - s.start_time).num_minutes());
            print_json(&json!({
                "shift": shift,
                "elapsed": elapsed.map(format_duration_minutes),
            }))?;
        }
    }
    Ok(())
}
