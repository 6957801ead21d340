use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{
    default_work_schedule, AxisSettings, BoardsByMode, BusyBlock, DailyNotes, Mode, Session,
    Shift, Task, WorkSchedule,
};

/// Rollback point captured immediately before an auto-close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoSnapshot {
    pub sessions: Vec<Session>,
    pub current_session_id: Option<String>,
}

impl UndoSnapshot {
    /// At most one open session, named by the pointer.
    pub fn is_consistent(&self) -> bool {
        running_matches_pointer(&self.sessions, self.current_session_id.as_deref())
    }
}

/// Whether a session is currently being tracked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionPhase<'a> {
    Idle,
    Running(&'a Session),
}

/// Complete in-memory state of one store instance.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisState {
    pub mode: Mode,
    pub sessions: Vec<Session>,
    pub busy_blocks: Vec<BusyBlock>,
    pub work_schedule: Vec<WorkSchedule>,
    pub shifts: Vec<Shift>,
    pub current_shift_id: Option<String>,
    pub settings: AxisSettings,
    pub current_session_id: Option<String>,
    pub tasks: Vec<Task>,
    pub notes_by_day: BTreeMap<String, DailyNotes>,
    pub brain_dump_by_mode: BoardsByMode,
    pub undo_state: Option<UndoSnapshot>,
}

impl Default for AxisState {
    fn default() -> Self {
        Self {
            mode: Mode::Work,
            sessions: Vec::new(),
            busy_blocks: Vec::new(),
            work_schedule: default_work_schedule(),
            shifts: Vec::new(),
            current_shift_id: None,
            settings: AxisSettings::default(),
            current_session_id: None,
            tasks: Vec::new(),
            notes_by_day: BTreeMap::new(),
            brain_dump_by_mode: BoardsByMode::default(),
            undo_state: None,
        }
    }
}

impl AxisState {
    pub fn current_session(&self) -> Option<&Session> {
        let id = self.current_session_id.as_deref()?;
        self.sessions
            .iter()
            .find(|s| s.id == id && s.is_running())
    }

    pub fn phase(&self) -> SessionPhase<'_> {
        match self.current_session() {
            Some(session) => SessionPhase::Running(session),
            None => SessionPhase::Idle,
        }
    }

    pub fn current_shift(&self) -> Option<&Shift> {
        let id = self.current_shift_id.as_deref()?;
        self.shifts
            .iter()
            .find(|s| s.id == id && s.end_time.is_none())
    }

    /// At most one running session, and the pointer names exactly that one.
    pub fn invariant_holds(&self) -> bool {
        running_matches_pointer(&self.sessions, self.current_session_id.as_deref())
    }

    /// The subset written to storage; the undo snapshot is not persisted.
    pub fn persisted(&self) -> PersistedState<'_> {
        PersistedState {
            mode: self.mode,
            sessions: &self.sessions,
            busy_blocks: &self.busy_blocks,
            work_schedule: &self.work_schedule,
            shifts: &self.shifts,
            current_shift_id: self.current_shift_id.as_deref(),
            settings: &self.settings,
            current_session_id: self.current_session_id.as_deref(),
            tasks: &self.tasks,
            notes_by_day: &self.notes_by_day,
            brain_dump_by_mode: &self.brain_dump_by_mode,
        }
    }
}

fn running_matches_pointer(sessions: &[Session], current: Option<&str>) -> bool {
    let mut running = sessions.iter().filter(|s| s.is_running());
    match (current, running.next(), running.next()) {
        (None, None, _) => true,
        (Some(id), Some(only), None) => only.id == id,
        _ => false,
    }
}

/// Borrowed view of the persisted blob.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState<'a> {
    pub mode: Mode,
    pub sessions: &'a [Session],
    pub busy_blocks: &'a [BusyBlock],
    pub work_schedule: &'a [WorkSchedule],
    pub shifts: &'a [Shift],
    pub current_shift_id: Option<&'a str>,
    pub settings: &'a AxisSettings,
    pub current_session_id: Option<&'a str>,
    pub tasks: &'a [Task],
    pub notes_by_day: &'a BTreeMap<String, DailyNotes>,
    pub brain_dump_by_mode: &'a BoardsByMode,
}
