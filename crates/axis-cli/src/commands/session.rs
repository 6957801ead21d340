use axis_core::insights::{session_duration_minutes, session_label};
use axis_core::schedule::next_suggestion;
use axis_core::time::format_duration_minutes;
use axis_core::SessionType;
use chrono::{Local, Utc};
use clap::Subcommand;
use serde_json::json;

use super::{print_json, signed_in_store, CmdResult};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a session, auto-closing the running one
    Start {
        /// focus, short_break, lunch or task_break
        session_type: SessionType,
        /// Task the session works on
        #[arg(long)]
        task_id: Option<String>,
    },
    /// End the running session
    End,
    /// End the running session as auto-closed (undoable)
    AutoEnd,
    /// Restore the sessions as they were before the last auto-close
    Undo,
    /// Print the running session and the next suggested break
    Status,
}

pub fn run(action: SessionAction) -> CmdResult {
    let mut store = signed_in_store()?;

    match action {
        SessionAction::Start {
            session_type,
            task_id,
        } => {
            store.start_session(session_type, task_id);
            print_json(&store.current_session())?;
        }
        SessionAction::End => {
            let changed = store.end_session();
            print_json(&json!({ "type": "session_ended", "changed": changed }))?;
        }
        SessionAction::AutoEnd => {
            let changed = store.auto_end_session();
            print_json(&json!({ "type": "session_auto_ended", "changed": changed }))?;
        }
        SessionAction::Undo => {
            let changed = store.undo_last_action();
            print_json(&json!({
                "type": "undo",
                "changed": changed,
                "currentSession": store.current_session(),
            }))?;
        }
        SessionAction::Status => {
            let now = Utc::now();
            let running = store.current_session().map(|session| {
                let elapsed = session_duration_minutes(session, now);
                json!({
                    "label": session_label(session.session_type),
                    "elapsed": format_duration_minutes(elapsed),
                    "elapsedMinutes": elapsed,
                    "session": session,
                })
            });
            print_json(&json!({
                "mode": store.mode(),
                "running": running,
                "canUndo": store.can_undo(),
                "nextBreak": next_suggestion(store.state(), now, &Local),
            }))?;
        }
    }
    Ok(())
}
