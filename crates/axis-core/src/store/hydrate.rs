//! Loading and normalizing the persisted state blob.
//!
//! Blobs written by older revisions may lack fields (task completion,
//! board item geometry, shifts) or use legacy note keys without a mode
//! suffix. Everything missing takes the default. Records are decoded one
//! at a time: a record that no longer fits its type is dropped with a
//! warning and the rest of the blob is kept. Only a blob that is not a
//! JSON object is rejected as a whole.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::state::AxisState;
use crate::models::{
    notes_key, AxisSettings, BoardColor, BoardItem, BoardItemKind, BoardsByMode, BrainDumpBoard,
    BusyBlock, Camera, DailyNotes, Mode, Session, SessionSource, Shift, Task, TaskPriority,
    WorkSchedule, DEFAULT_BOARD_ITEM_HEIGHT, DEFAULT_BOARD_ITEM_WIDTH, DEFAULT_GRID_SIZE,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredState {
    mode: Option<Value>,
    sessions: Option<Value>,
    busy_blocks: Option<Value>,
    work_schedule: Option<Value>,
    shifts: Option<Value>,
    current_shift_id: Option<Value>,
    settings: Option<Value>,
    current_session_id: Option<Value>,
    tasks: Option<Value>,
    notes_by_day: Option<BTreeMap<String, Value>>,
    brain_dump_by_mode: Option<StoredBoards>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    id: String,
    title: String,
    #[serde(default)]
    mode: Option<Mode>,
    #[serde(default)]
    priority: Option<TaskPriority>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    deferred_until: Option<DateTime<Utc>>,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredBoards {
    work: Option<Value>,
    home: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredBoard {
    items: Option<Value>,
    camera: Option<Value>,
    snap_to_grid: Option<Value>,
    grid_size: Option<Value>,
    doodle_data_url: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredBoardItem {
    id: String,
    #[serde(default, rename = "type")]
    kind: Option<BoardItemKind>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    image_data_url: Option<String>,
    #[serde(default)]
    color: Option<BoardColor>,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
    #[serde(default)]
    z_index: Option<u32>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

/// Parse a persisted blob into a normalized state.
///
/// Returns `None` only when the blob is not a JSON object.
pub fn parse_persisted(raw: &str, now: DateTime<Utc>) -> Option<AxisState> {
    match serde_json::from_str::<StoredState>(raw) {
        Ok(stored) => Some(normalize(stored, now)),
        Err(e) => {
            tracing::warn!(error = %e, "persisted state unreadable");
            None
        }
    }
}

/// Decode one value, dropping it with a warning when it does not fit.
fn decode<T: DeserializeOwned>(value: Option<Value>, field: &str) -> Option<T> {
    match serde_json::from_value(value?) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::warn!(field, error = %e, "dropping unreadable persisted value");
            None
        }
    }
}

/// Decode a list element by element.
fn decode_list<T: DeserializeOwned>(value: Option<Value>, field: &str) -> Option<Vec<T>> {
    match value? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| decode(Some(item), field))
                .collect(),
        ),
        other => {
            tracing::warn!(field, found = %other, "expected a list in persisted state");
            None
        }
    }
}

fn normalize(stored: StoredState, now: DateTime<Utc>) -> AxisState {
    let defaults = AxisState::default();
    let persisted_mode: Option<Mode> = decode(stored.mode, "mode");

    let tasks = decode_list::<StoredTask>(stored.tasks, "tasks")
        .unwrap_or_default()
        .into_iter()
        .map(|task| Task {
            id: task.id,
            title: task.title,
            mode: task.mode.or(persisted_mode).unwrap_or(Mode::Work),
            priority: task.priority.unwrap_or(TaskPriority::Medium),
            created_at: task.created_at,
            deferred_until: task.deferred_until,
            completed: task.completed.unwrap_or(false),
            completed_at: task.completed_at,
        })
        .collect();

    let mut notes_by_day = BTreeMap::new();
    for (key, raw) in stored.notes_by_day.unwrap_or_default() {
        let Some(notes) = decode::<DailyNotes>(Some(raw), "notesByDay") else {
            continue;
        };
        if key.contains('_') {
            notes_by_day.insert(key, notes);
        } else {
            notes_by_day.insert(notes_key(&key, Mode::Work), notes);
        }
    }

    let boards = stored.brain_dump_by_mode.unwrap_or_default();
    let brain_dump_by_mode = BoardsByMode {
        work: normalize_board(decode(boards.work, "brainDumpByMode.work"), now),
        home: normalize_board(decode(boards.home, "brainDumpByMode.home"), now),
    };

    let mut state = AxisState {
        mode: persisted_mode.unwrap_or(defaults.mode),
        sessions: decode_list::<Session>(stored.sessions, "sessions").unwrap_or_default(),
        busy_blocks: decode_list::<BusyBlock>(stored.busy_blocks, "busyBlocks")
            .unwrap_or_default(),
        work_schedule: decode_list::<WorkSchedule>(stored.work_schedule, "workSchedule")
            .unwrap_or(defaults.work_schedule),
        shifts: decode_list::<Shift>(stored.shifts, "shifts").unwrap_or_default(),
        current_shift_id: decode(stored.current_shift_id, "currentShiftId"),
        settings: decode::<AxisSettings>(stored.settings, "settings").unwrap_or(defaults.settings),
        current_session_id: decode(stored.current_session_id, "currentSessionId"),
        tasks,
        notes_by_day,
        brain_dump_by_mode,
        undo_state: None,
    };
    reconcile_current_session(&mut state, now);
    reconcile_current_shift(&mut state);
    state
}

fn normalize_board(board: Option<StoredBoard>, now: DateTime<Utc>) -> BrainDumpBoard {
    let board = board.unwrap_or_default();
    let items = decode_list::<StoredBoardItem>(board.items, "board.items")
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, item)| BoardItem {
            id: item.id,
            kind: item.kind.unwrap_or_default(),
            text: item.text,
            image_data_url: item.image_data_url,
            color: item.color.unwrap_or_default(),
            x: item.x,
            y: item.y,
            width: item.width.unwrap_or(DEFAULT_BOARD_ITEM_WIDTH),
            height: item.height.unwrap_or(DEFAULT_BOARD_ITEM_HEIGHT),
            z_index: item.z_index.unwrap_or(index as u32 + 1),
            created_at: item.created_at.unwrap_or(now),
        })
        .collect();
    BrainDumpBoard {
        items,
        camera: decode::<Camera>(board.camera, "board.camera").unwrap_or_default(),
        snap_to_grid: decode(board.snap_to_grid, "board.snapToGrid").unwrap_or(false),
        grid_size: decode(board.grid_size, "board.gridSize").unwrap_or(DEFAULT_GRID_SIZE),
        doodle_data_url: decode(board.doodle_data_url, "board.doodleDataUrl"),
    }
}

/// Make the current-session pointer authoritative.
///
/// A dangling or closed pointer is cleared; with no pointer, the most
/// recently started open session is adopted; any other open session is
/// closed as auto-closed at `now`.
fn reconcile_current_session(state: &mut AxisState, now: DateTime<Utc>) {
    let pointer_valid = state.current_session().is_some();
    if !pointer_valid {
        state.current_session_id = state
            .sessions
            .iter()
            .filter(|s| s.is_running())
            .max_by_key(|s| s.start_time)
            .map(|s| s.id.clone());
    }

    let current = state.current_session_id.clone();
    for session in state.sessions.iter_mut() {
        if session.is_running() && current.as_deref() != Some(session.id.as_str()) {
            tracing::debug!(session_id = %session.id, "closing orphaned open session");
            session.end_time = Some(now.max(session.start_time));
            session.source = SessionSource::AutoClosed;
        }
    }
}

fn reconcile_current_shift(state: &mut AxisState) {
    if state.current_shift().is_none() {
        state.current_shift_id = None;
    }
}
