//! Daily notes commands for CLI.

use axis_core::models::NotesPatch;
use axis_core::time::day_key;
use axis_core::Mode;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use serde_json::json;

use super::{parse_date, print_json, signed_in_store, today, CmdResult};

#[derive(Args)]
pub struct NotesScope {
    /// Day (YYYY-MM-DD, default: today)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
    /// Mode (default: current mode)
    #[arg(long)]
    mode: Option<Mode>,
}

#[derive(Subcommand)]
pub enum NotesAction {
    /// Print a day's notes
    Show {
        #[command(flatten)]
        scope: NotesScope,
    },
    /// Replace meeting notes or the free-form brain dump
    Set {
        #[command(flatten)]
        scope: NotesScope,
        #[arg(long)]
        meeting: Option<String>,
        #[arg(long)]
        brain_dump: Option<String>,
    },
    /// Add a brain-dump item at the top of the day's list
    DumpAdd {
        #[command(flatten)]
        scope: NotesScope,
        text: String,
    },
    /// Remove a brain-dump item
    DumpDelete {
        #[command(flatten)]
        scope: NotesScope,
        /// Item ID
        id: String,
    },
}

pub fn run(action: NotesAction) -> CmdResult {
    let mut store = signed_in_store()?;
    let resolve = |scope: &NotesScope, current: Mode| {
        (
            day_key(scope.date.unwrap_or_else(today)),
            scope.mode.unwrap_or(current),
        )
    };

    match action {
        NotesAction::Show { scope } => {
            let (day, mode) = resolve(&scope, store.mode());
            print_json(&store.notes(&day, mode))?;
        }
        NotesAction::Set {
            scope,
            meeting,
            brain_dump,
        } => {
            let (day, mode) = resolve(&scope, store.mode());
            store.update_notes(
                &day,
                mode,
                NotesPatch {
                    meeting_notes: meeting,
                    brain_dump,
                },
            );
            print_json(&store.notes(&day, mode))?;
        }
        NotesAction::DumpAdd { scope, text } => {
            let (day, mode) = resolve(&scope, store.mode());
            let id = store.add_brain_dump_item(&day, mode, text);
            print_json(&json!({ "type": "dump_added", "id": id }))?;
        }
        NotesAction::DumpDelete { scope, id } => {
            let (day, mode) = resolve(&scope, store.mode());
            let deleted = store.delete_brain_dump_item(&day, mode, &id);
            print_json(&json!({ "type": "dump_deleted", "id": id, "changed": deleted }))?;
        }
    }
    Ok(())
}
