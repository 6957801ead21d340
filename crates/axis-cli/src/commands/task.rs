//! Task management commands for CLI.

use axis_core::models::TaskPatch;
use axis_core::{Mode, TaskPriority};
use chrono::Utc;
use clap::Subcommand;
use serde_json::json;

use super::{print_json, signed_in_store, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task at the top of the list
    Add {
        /// Task title
        title: String,
        /// low, medium or high
        #[arg(long, default_value = "medium")]
        priority: TaskPriority,
        /// Mode the task belongs to (default: current mode)
        #[arg(long)]
        mode: Option<Mode>,
    },
    /// List tasks of a mode
    List {
        /// Mode to list (default: current mode)
        #[arg(long)]
        mode: Option<Mode>,
        /// Show delayed tasks instead of active ones
        #[arg(long)]
        delayed: bool,
    },
    /// Toggle a task's completion
    Done {
        /// Task ID
        id: String,
    },
    /// Hide a task for the next 24 hours
    Delay {
        /// Task ID
        id: String,
    },
    /// Update a task
    Update {
        /// Task ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        priority: Option<TaskPriority>,
        #[arg(long)]
        mode: Option<Mode>,
        /// Bring a delayed task back now
        #[arg(long)]
        undelay: bool,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

pub fn run(action: TaskAction) -> CmdResult {
    let mut store = signed_in_store()?;

    match action {
        TaskAction::Add {
            title,
            priority,
            mode,
        } => {
            let mode = mode.unwrap_or(store.mode());
            let id = store.add_task(title, priority, mode);
            print_json(&store.state().tasks.iter().find(|t| t.id == id))?;
        }
        TaskAction::List { mode, delayed } => {
            let mode = mode.unwrap_or(store.mode());
            let now = Utc::now();
            let tasks = if delayed {
                store.delayed_tasks(mode, now)
            } else {
                store.active_tasks(mode, now)
            };
            print_json(&tasks)?;
        }
        TaskAction::Done { id } => {
            ensure_found(store.toggle_task_completion(&id), &id)?;
            print_json(&store.state().tasks.iter().find(|t| t.id == id))?;
        }
        TaskAction::Delay { id } => {
            ensure_found(store.delay_task(&id), &id)?;
            print_json(&store.state().tasks.iter().find(|t| t.id == id))?;
        }
        TaskAction::Update {
            id,
            title,
            priority,
            mode,
            undelay,
        } => {
            let patch = TaskPatch {
                title,
                mode,
                priority,
                deferred_until: undelay.then_some(None),
            };
            ensure_found(store.update_task(&id, patch), &id)?;
            print_json(&store.state().tasks.iter().find(|t| t.id == id))?;
        }
        TaskAction::Delete { id } => {
            let deleted = store.delete_task(&id);
            print_json(&json!({ "type": "task_deleted", "id": id, "changed": deleted }))?;
        }
    }
    Ok(())
}

fn ensure_found(found: bool, id: &str) -> CmdResult {
    if found {
        Ok(())
    } else {
        Err(format!("task not found: {id}").into())
    }
}
