//! Busy block commands for CLI.

use axis_core::schedule::blocks_on_day;
use axis_core::store::BusyBlockPatch;
use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::Subcommand;
use serde_json::json;

use super::{parse_date, parse_datetime, print_json, signed_in_store, today, CmdResult};

#[derive(Subcommand)]
pub enum BlockAction {
    /// Add a busy block
    Add {
        /// Block title
        title: String,
        /// Start time (RFC 3339, "YYYY-MM-DD HH:MM" or "HH:MM")
        #[arg(long, value_parser = parse_datetime)]
        start: DateTime<Utc>,
        /// End time, same formats as --start
        #[arg(long, value_parser = parse_datetime)]
        end: DateTime<Utc>,
    },
    /// List busy blocks
    List {
        /// Only blocks starting on this day (YYYY-MM-DD); "today" if --today
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Only today's blocks
        #[arg(long, conflicts_with = "date")]
        today: bool,
    },
    /// Update a busy block
    Update {
        /// Block ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, value_parser = parse_datetime)]
        start: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_datetime)]
        end: Option<DateTime<Utc>>,
    },
    /// Delete a busy block
    Delete {
        /// Block ID
        id: String,
    },
}

pub fn run(action: BlockAction) -> CmdResult {
    let mut store = signed_in_store()?;

    match action {
        BlockAction::Add { title, start, end } => {
            let id = store.add_busy_block(title, start, end)?;
            let block = store.state().busy_blocks.iter().find(|b| b.id == id);
            print_json(&block)?;
        }
        BlockAction::List { date, today: only_today } => {
            let date = if only_today { Some(today()) } else { date };
            match date {
                Some(date) => print_json(&blocks_on_day(&store.state().busy_blocks, date, &Local))?,
                None => print_json(&store.state().busy_blocks)?,
            }
        }
        BlockAction::Update {
            id,
            title,
            start,
            end,
        } => {
            let patch = BusyBlockPatch {
                title,
                start_time: start,
                end_time: end,
            };
            if !store.update_busy_block(&id, patch)? {
                return Err(format!("busy block not found: {id}").into());
            }
            let block = store.state().busy_blocks.iter().find(|b| b.id == id);
            print_json(&block)?;
        }
        BlockAction::Delete { id } => {
            let deleted = store.delete_busy_block(&id);
            print_json(&json!({ "type": "block_deleted", "id": id, "changed": deleted }))?;
        }
    }
    Ok(())
}
