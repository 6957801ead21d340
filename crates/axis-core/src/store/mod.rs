//! Session store.
//!
//! An explicitly constructed state container. Every action computes the
//! next state in place, writes the persisted subset to storage and then
//! calls every subscriber before returning.
//!
//! ## Session transitions
//!
//! ```text
//! Idle --start--> Running --end / auto_end / set_mode--> Idle
//! Running --start--> Running (previous session auto-closed)
//! ```
//!
//! Every auto-close captures a single undo snapshot of `sessions` and
//! `current_session_id` taken just before the close. `undo_last_action`
//! restores it verbatim. Ending a session while idle is a no-op.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = AxisStore::hydrate(KvStorage::open()?);
//! store.start_session(SessionType::Focus, None);
//! store.end_session();
//! ```

mod hydrate;
mod state;

pub use hydrate::parse_persisted;
pub use state::{AxisState, PersistedState, SessionPhase, UndoSnapshot};

use chrono::{DateTime, Duration, Utc};

use crate::error::ValidationError;
use crate::models::{
    new_id, notes_key, BoardItem, BoardItemPatch, BrainDumpBoard, BrainDumpItem, BusyBlock,
    Camera, DailyNotes, Mode, ModeSettingsPatch, NotesPatch, Session, SessionSource, SessionType,
    Shift, Task, TaskPatch, TaskPriority, WorkSchedule,
};
use crate::storage::{StateStorage, STATE_KEY};

/// Observer called with the new state after every change.
pub type Listener = Box<dyn Fn(&AxisState)>;

/// Source of "now" for every action.
pub type Clock = Box<dyn Fn() -> DateTime<Utc>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Partial update for a [`BusyBlock`].
#[derive(Debug, Clone, Default)]
pub struct BusyBlockPatch {
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

const TASK_DELAY_HOURS: i64 = 24;

pub struct AxisStore {
    state: AxisState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    storage: Option<Box<dyn StateStorage>>,
    state_key: String,
    clock: Clock,
}

impl AxisStore {
    /// Create a store over `initial` with no storage attached.
    pub fn new(initial: AxisState) -> Self {
        Self {
            state: initial,
            listeners: Vec::new(),
            next_subscription: 0,
            storage: None,
            state_key: STATE_KEY.to_string(),
            clock: Box::new(Utc::now),
        }
    }

    /// Load the persisted blob from `storage` once, normalize it, and keep
    /// `storage` as the write target.
    ///
    /// A missing blob yields the default state.
    pub fn hydrate(storage: impl StateStorage + 'static) -> Self {
        Self::hydrate_with_key(storage, STATE_KEY)
    }

    pub fn hydrate_with_key(storage: impl StateStorage + 'static, key: &str) -> Self {
        Self::default().load_from(storage, key)
    }

    /// Replace the state with the blob stored under `key`, normalized
    /// against this store's clock, and keep `storage` as the write target.
    ///
    /// A blob that is not a JSON object is copied to
    /// `{key}_unreadable` before anything can overwrite it. If that copy
    /// or the initial read fails, the store keeps running without storage.
    pub fn load_from(mut self, storage: impl StateStorage + 'static, key: &str) -> Self {
        let now = self.now();
        self.state_key = key.to_string();
        match storage.load(key) {
            Ok(Some(raw)) => match parse_persisted(&raw, now) {
                Some(state) => self.state = state,
                None => {
                    let backup = unreadable_key(key);
                    if let Err(e) = storage.save(&backup, &raw) {
                        tracing::warn!(error = %e, "failed to back up unreadable state, not persisting");
                        return self;
                    }
                    tracing::warn!(backup = %backup, "unreadable state backed up, using defaults");
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted state, not persisting");
                return self;
            }
        }
        self.with_storage(storage)
    }

    pub fn with_storage(mut self, storage: impl StateStorage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Seed the undo snapshot kept outside the persisted blob, e.g. by a
    /// previous process. Inconsistent snapshots are dropped.
    pub fn with_undo_state(mut self, snapshot: Option<UndoSnapshot>) -> Self {
        self.state.undo_state = snapshot.filter(|s| {
            let ok = s.is_consistent();
            if !ok {
                tracing::warn!("discarding inconsistent undo snapshot");
            }
            ok
        });
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &AxisState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.state.current_session()
    }

    pub fn phase(&self) -> SessionPhase<'_> {
        self.state.phase()
    }

    pub fn can_undo(&self) -> bool {
        self.state.undo_state.is_some()
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Tasks of `mode` that are not deferred past `now`.
    pub fn active_tasks(&self, mode: Mode, now: DateTime<Utc>) -> Vec<&Task> {
        self.state
            .tasks
            .iter()
            .filter(|t| t.mode == mode && !t.is_deferred(now))
            .collect()
    }

    /// Tasks of `mode` hidden until a later time.
    pub fn delayed_tasks(&self, mode: Mode, now: DateTime<Utc>) -> Vec<&Task> {
        self.state
            .tasks
            .iter()
            .filter(|t| t.mode == mode && t.is_deferred(now))
            .collect()
    }

    pub fn notes(&self, day_key: &str, mode: Mode) -> DailyNotes {
        self.state
            .notes_by_day
            .get(&notes_key(day_key, mode))
            .cloned()
            .unwrap_or_default()
    }

    pub fn board(&self, mode: Mode) -> &BrainDumpBoard {
        self.state.brain_dump_by_mode.for_mode(mode)
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&mut self, listener: impl Fn(&AxisState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    // ── Session transitions ──────────────────────────────────────────

    /// Start a new session, auto-closing any running one first.
    ///
    /// Returns the id of the new session.
    pub fn start_session(&mut self, session_type: SessionType, task_id: Option<String>) -> String {
        let now = self.now();
        let mode = self.state.mode;
        let intended_minutes = self
            .state
            .settings
            .for_mode(mode)
            .intended_minutes(session_type);

        self.close_current(SessionSource::AutoClosed, now);

        let session = Session {
            id: new_id(),
            mode,
            session_type,
            start_time: now,
            end_time: None,
            intended_minutes,
            source: SessionSource::Manual,
            task_id,
        };
        let id = session.id.clone();
        tracing::debug!(session_id = %id, session_type = session_type.as_str(), "session started");
        self.state.sessions.push(session);
        self.state.current_session_id = Some(id.clone());
        self.commit();
        id
    }

    /// Close the running session as manual. No-op when idle.
    pub fn end_session(&mut self) -> bool {
        let now = self.now();
        if self.close_current(SessionSource::Manual, now) {
            self.commit();
            true
        } else {
            false
        }
    }

    /// Close the running session as auto-closed, capturing an undo snapshot.
    /// No-op when idle.
    pub fn auto_end_session(&mut self) -> bool {
        let now = self.now();
        if self.close_current(SessionSource::AutoClosed, now) {
            self.commit();
            true
        } else {
            false
        }
    }

    /// Restore the sessions as they were before the last auto-close.
    pub fn undo_last_action(&mut self) -> bool {
        let Some(snapshot) = self.state.undo_state.take() else {
            return false;
        };
        tracing::debug!("undoing last auto-close");
        self.state.sessions = snapshot.sessions;
        self.state.current_session_id = snapshot.current_session_id;
        self.commit();
        true
    }

    /// Switch mode, auto-closing a session that belongs to the old mode.
    pub fn set_mode(&mut self, next: Mode) -> bool {
        if self.state.mode == next {
            return false;
        }
        let now = self.now();
        let stale = self
            .state
            .current_session()
            .is_some_and(|s| s.mode != next);
        if stale {
            self.close_current(SessionSource::AutoClosed, now);
        }
        self.state.mode = next;
        self.commit();
        true
    }

    // ── Busy blocks ──────────────────────────────────────────────────

    pub fn add_busy_block(
        &mut self,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<String, ValidationError> {
        check_range(start_time, end_time)?;
        let block = BusyBlock {
            id: new_id(),
            title: title.into(),
            start_time,
            end_time,
        };
        let id = block.id.clone();
        self.state.busy_blocks.push(block);
        self.commit();
        Ok(id)
    }

    pub fn update_busy_block(
        &mut self,
        id: &str,
        patch: BusyBlockPatch,
    ) -> Result<bool, ValidationError> {
        let Some(block) = self.state.busy_blocks.iter_mut().find(|b| b.id == id) else {
            return Ok(false);
        };
        let start = patch.start_time.unwrap_or(block.start_time);
        let end = patch.end_time.unwrap_or(block.end_time);
        check_range(start, end)?;
        block.start_time = start;
        block.end_time = end;
        if let Some(title) = patch.title {
            block.title = title;
        }
        self.commit();
        Ok(true)
    }

    pub fn delete_busy_block(&mut self, id: &str) -> bool {
        let before = self.state.busy_blocks.len();
        self.state.busy_blocks.retain(|b| b.id != id);
        self.commit_if(self.state.busy_blocks.len() != before)
    }

    // ── Settings & schedule ──────────────────────────────────────────

    pub fn update_settings(&mut self, mode: Mode, patch: ModeSettingsPatch) {
        patch.apply(self.state.settings.for_mode_mut(mode));
        self.commit();
    }

    /// Replace the work-schedule table after validating every entry.
    pub fn set_work_schedule(&mut self, schedule: Vec<WorkSchedule>) -> Result<(), ValidationError> {
        for entry in &schedule {
            entry.validate()?;
        }
        self.state.work_schedule = schedule;
        self.commit();
        Ok(())
    }

    // ── Tasks ────────────────────────────────────────────────────────

    /// Add a task at the top of the list.
    pub fn add_task(&mut self, title: impl Into<String>, priority: TaskPriority, mode: Mode) -> String {
        let task = Task {
            id: new_id(),
            title: title.into(),
            mode,
            priority,
            created_at: self.now(),
            deferred_until: None,
            completed: false,
            completed_at: None,
        };
        let id = task.id.clone();
        self.state.tasks.insert(0, task);
        self.commit();
        id
    }

    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> bool {
        let Some(task) = self.task_mut(id) else {
            return false;
        };
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(mode) = patch.mode {
            task.mode = mode;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(deferred_until) = patch.deferred_until {
            task.deferred_until = deferred_until;
        }
        self.commit();
        true
    }

    pub fn delete_task(&mut self, id: &str) -> bool {
        let before = self.state.tasks.len();
        self.state.tasks.retain(|t| t.id != id);
        self.commit_if(self.state.tasks.len() != before)
    }

    /// Hide a task for the next 24 hours.
    pub fn delay_task(&mut self, id: &str) -> bool {
        let until = self.now() + Duration::hours(TASK_DELAY_HOURS);
        let Some(task) = self.task_mut(id) else {
            return false;
        };
        task.deferred_until = Some(until);
        self.commit();
        true
    }

    pub fn toggle_task_completion(&mut self, id: &str) -> bool {
        let now = self.now();
        let Some(task) = self.task_mut(id) else {
            return false;
        };
        task.completed = !task.completed;
        task.completed_at = task.completed.then_some(now);
        self.commit();
        true
    }

    // ── Shifts ───────────────────────────────────────────────────────

    /// Open a shift in the current mode. No-op if one is already open.
    pub fn clock_in(&mut self) -> Option<String> {
        if self.state.current_shift().is_some() {
            return None;
        }
        let shift = Shift {
            id: new_id(),
            mode: self.state.mode,
            start_time: self.now(),
            end_time: None,
        };
        let id = shift.id.clone();
        self.state.shifts.push(shift);
        self.state.current_shift_id = Some(id.clone());
        self.commit();
        Some(id)
    }

    pub fn clock_out(&mut self) -> bool {
        let now = self.now();
        let Some(id) = self.state.current_shift_id.take() else {
            return false;
        };
        if let Some(shift) = self.state.shifts.iter_mut().find(|s| s.id == id) {
            shift.end_time = Some(now);
        }
        self.commit();
        true
    }

    // ── Notes ────────────────────────────────────────────────────────

    pub fn update_notes(&mut self, day_key: &str, mode: Mode, patch: NotesPatch) {
        let notes = self.notes_mut(day_key, mode);
        if let Some(meeting_notes) = patch.meeting_notes {
            notes.meeting_notes = meeting_notes;
        }
        if let Some(brain_dump) = patch.brain_dump {
            notes.brain_dump = brain_dump;
        }
        self.commit();
    }

    pub fn add_brain_dump_item(&mut self, day_key: &str, mode: Mode, text: impl Into<String>) -> String {
        let item = BrainDumpItem {
            id: new_id(),
            text: text.into(),
            created_at: self.now(),
        };
        let id = item.id.clone();
        self.notes_mut(day_key, mode).brain_dump_items.insert(0, item);
        self.commit();
        id
    }

    pub fn delete_brain_dump_item(&mut self, day_key: &str, mode: Mode, item_id: &str) -> bool {
        let changed = match self.state.notes_by_day.get_mut(&notes_key(day_key, mode)) {
            Some(notes) => {
                let before = notes.brain_dump_items.len();
                notes.brain_dump_items.retain(|i| i.id != item_id);
                notes.brain_dump_items.len() != before
            }
            None => false,
        };
        self.commit_if(changed)
    }

    pub fn set_doodle(&mut self, day_key: &str, mode: Mode, data_url: Option<String>) {
        self.notes_mut(day_key, mode).doodle_data_url = data_url;
        self.commit();
    }

    // ── Brain-dump board ─────────────────────────────────────────────

    pub fn add_board_item(&mut self, mode: Mode, item: BoardItem) {
        self.board_mut(mode).items.insert(0, item);
        self.commit();
    }

    pub fn update_board_item(&mut self, mode: Mode, item_id: &str, patch: BoardItemPatch) -> bool {
        let Some(item) = self.board_mut(mode).items.iter_mut().find(|i| i.id == item_id) else {
            return false;
        };
        if let Some(text) = patch.text {
            item.text = Some(text);
        }
        if let Some(color) = patch.color {
            item.color = color;
        }
        if let Some(x) = patch.x {
            item.x = x;
        }
        if let Some(y) = patch.y {
            item.y = y;
        }
        if let Some(width) = patch.width {
            item.width = width;
        }
        if let Some(height) = patch.height {
            item.height = height;
        }
        if let Some(z_index) = patch.z_index {
            item.z_index = z_index;
        }
        self.commit();
        true
    }

    pub fn delete_board_item(&mut self, mode: Mode, item_id: &str) -> bool {
        let items = &mut self.board_mut(mode).items;
        let before = items.len();
        items.retain(|i| i.id != item_id);
        let changed = items.len() != before;
        self.commit_if(changed)
    }

    pub fn set_board_grid(&mut self, mode: Mode, snap_to_grid: Option<bool>, grid_size: Option<u32>) {
        let board = self.board_mut(mode);
        if let Some(snap) = snap_to_grid {
            board.snap_to_grid = snap;
        }
        if let Some(size) = grid_size {
            board.grid_size = size;
        }
        self.commit();
    }

    pub fn set_board_camera(&mut self, mode: Mode, camera: Camera) {
        self.board_mut(mode).camera = camera;
        self.commit();
    }

    pub fn set_board_doodle(&mut self, mode: Mode, data_url: Option<String>) {
        self.board_mut(mode).doodle_data_url = data_url;
        self.commit();
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Close the current session with `source`. Auto-closes capture the
    /// pre-close sessions as the undo snapshot, replacing any older one.
    fn close_current(&mut self, source: SessionSource, now: DateTime<Utc>) -> bool {
        let Some(id) = self.state.current_session_id.clone() else {
            return false;
        };
        let Some(index) = self
            .state
            .sessions
            .iter()
            .position(|s| s.id == id && s.is_running())
        else {
            return false;
        };

        if source == SessionSource::AutoClosed {
            self.state.undo_state = Some(UndoSnapshot {
                sessions: self.state.sessions.clone(),
                current_session_id: Some(id.clone()),
            });
        }

        let session = &mut self.state.sessions[index];
        session.end_time = Some(now.max(session.start_time));
        session.source = source;
        self.state.current_session_id = None;
        tracing::debug!(session_id = %id, ?source, "session closed");
        true
    }

    fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.state.tasks.iter_mut().find(|t| t.id == id)
    }

    fn notes_mut(&mut self, day_key: &str, mode: Mode) -> &mut DailyNotes {
        self.state
            .notes_by_day
            .entry(notes_key(day_key, mode))
            .or_default()
    }

    fn board_mut(&mut self, mode: Mode) -> &mut BrainDumpBoard {
        self.state.brain_dump_by_mode.for_mode_mut(mode)
    }

    fn commit_if(&mut self, changed: bool) -> bool {
        if changed {
            self.commit();
        }
        changed
    }

    /// Persist, then notify every subscriber.
    fn commit(&mut self) {
        debug_assert!(self.state.invariant_holds());
        self.persist();
        for (_, listener) in &self.listeners {
            listener(&self.state);
        }
    }

    /// Best-effort write; failures leave the in-memory state authoritative.
    fn persist(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        let json = match serde_json::to_string(&self.state.persisted()) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize state");
                return;
            }
        };
        if let Err(e) = storage.save(&self.state_key, &json) {
            tracing::warn!(error = %e, "failed to persist state");
        }
    }
}

impl Default for AxisStore {
    fn default() -> Self {
        Self::new(AxisState::default())
    }
}

fn unreadable_key(key: &str) -> String {
    format!("{key}_unreadable")
}

fn check_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if end <= start {
        return Err(ValidationError::InvalidTimeRange { start, end });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    /// Store whose clock is driven by the returned handle.
    fn store_with_clock(start: &str) -> (AxisStore, Rc<Cell<DateTime<Utc>>>) {
        let now = Rc::new(Cell::new(at(start)));
        let handle = now.clone();
        let store = AxisStore::default().with_clock(move || handle.get());
        (store, now)
    }

    #[test]
    fn start_session_uses_mode_settings() {
        let (mut store, _) = store_with_clock("2024-01-01T09:00:00Z");
        store.update_settings(
            Mode::Work,
            ModeSettingsPatch {
                short_break_minutes: Some(7),
                ..Default::default()
            },
        );
        store.start_session(SessionType::ShortBreak, None);
        let session = store.current_session().unwrap();
        assert_eq!(session.intended_minutes, 7);
        assert_eq!(session.mode, Mode::Work);
        assert_eq!(session.source, SessionSource::Manual);
        assert!(matches!(store.phase(), SessionPhase::Running(_)));
    }

    #[test]
    fn end_session_is_manual_and_keeps_undo() {
        let (mut store, now) = store_with_clock("2024-01-01T09:00:00Z");
        store.start_session(SessionType::Focus, None);
        store.start_session(SessionType::ShortBreak, None);
        assert!(store.can_undo());

        now.set(at("2024-01-01T09:10:00Z"));
        assert!(store.end_session());
        let last = store.state().sessions.last().unwrap();
        assert_eq!(last.source, SessionSource::Manual);
        assert_eq!(last.end_time, Some(at("2024-01-01T09:10:00Z")));
        assert!(store.state().current_session_id.is_none());
        assert!(store.can_undo());
        assert_eq!(store.phase(), SessionPhase::Idle);
    }

    #[test]
    fn ending_while_idle_is_noop() {
        let mut store = AxisStore::default();
        assert!(!store.end_session());
        assert!(!store.auto_end_session());
        assert!(!store.undo_last_action());
        assert!(store.state().sessions.is_empty());
    }

    #[test]
    fn start_during_break_auto_closes_and_undo_restores() {
        let (mut store, now) = store_with_clock("2024-01-01T10:00:00Z");
        let break_id = store.start_session(SessionType::ShortBreak, None);
        now.set(at("2024-01-01T10:04:00Z"));
        let focus_id = store.start_session(SessionType::Focus, None);

        let closed = &store.state().sessions[0];
        assert_eq!(closed.id, break_id);
        assert_eq!(closed.source, SessionSource::AutoClosed);
        assert_eq!(closed.end_time, Some(at("2024-01-01T10:04:00Z")));
        assert_eq!(store.state().current_session_id.as_deref(), Some(focus_id.as_str()));

        assert!(store.undo_last_action());
        assert_eq!(store.state().sessions.len(), 1);
        let restored = store.current_session().unwrap();
        assert_eq!(restored.id, break_id);
        assert!(restored.is_running());
        assert!(!store.undo_last_action());
    }

    #[test]
    fn auto_end_snapshot_is_exact() {
        let (mut store, now) = store_with_clock("2024-01-01T12:00:00Z");
        store.start_session(SessionType::Lunch, None);
        let before_sessions = store.state().sessions.clone();
        let before_current = store.state().current_session_id.clone();

        now.set(at("2024-01-01T13:30:00Z"));
        assert!(store.auto_end_session());
        assert_eq!(
            store.state().sessions[0].source,
            SessionSource::AutoClosed
        );

        store.undo_last_action();
        assert_eq!(store.state().sessions, before_sessions);
        assert_eq!(store.state().current_session_id, before_current);
    }

    #[test]
    fn second_auto_close_overwrites_snapshot() {
        let (mut store, _) = store_with_clock("2024-01-01T09:00:00Z");
        let first = store.start_session(SessionType::Focus, None);
        let second = store.start_session(SessionType::ShortBreak, None);
        store.start_session(SessionType::Focus, None);

        store.undo_last_action();
        // Only the most recent auto-close is reverted.
        assert_eq!(store.state().current_session_id.as_deref(), Some(second.as_str()));
        let first_session = store.state().sessions.iter().find(|s| s.id == first).unwrap();
        assert_eq!(first_session.source, SessionSource::AutoClosed);
        assert!(!store.undo_last_action());
    }

    #[test]
    fn set_mode_auto_closes_running_session() {
        let mut store = AxisStore::default();
        store.start_session(SessionType::Focus, None);
        assert!(store.set_mode(Mode::Home));
        assert_eq!(store.mode(), Mode::Home);
        assert!(store.current_session().is_none());
        assert_eq!(store.state().sessions[0].source, SessionSource::AutoClosed);
        assert!(store.can_undo());

        assert!(!store.set_mode(Mode::Home));
    }

    #[test]
    fn undo_after_mode_switch_restores_the_running_session() {
        let start = at("2024-01-01T09:00:00Z");
        let mut store = AxisStore::default().with_clock(move || start);
        let id = store.start_session(SessionType::Focus, None);
        let before = store.state().sessions.clone();

        store.set_mode(Mode::Home);
        assert!(store.undo_last_action());
        assert_eq!(store.state().sessions, before);
        assert_eq!(store.state().current_session_id.as_deref(), Some(id.as_str()));
        assert!(store.current_session().unwrap().is_running());
        assert!(!store.can_undo());
        assert_eq!(store.mode(), Mode::Home);
    }

    #[test]
    fn set_mode_when_idle_has_no_side_effect() {
        let mut store = AxisStore::default();
        store.set_mode(Mode::Home);
        assert!(store.state().sessions.is_empty());
        assert!(!store.can_undo());
    }

    #[test]
    fn listeners_see_every_change() {
        let mut store = AxisStore::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = store.subscribe(move |state| {
            sink.borrow_mut().push(state.current_session_id.is_some());
        });
        store.start_session(SessionType::Focus, None);
        store.end_session();
        store.end_session();
        assert_eq!(*seen.borrow(), vec![true, false]);

        assert!(store.unsubscribe(id));
        store.start_session(SessionType::Focus, None);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn persists_every_mutation_and_survives_write_failures() {
        let storage = MemoryStorage::new();
        let mut store = AxisStore::default().with_storage(storage.clone());
        store.start_session(SessionType::Focus, None);
        let raw = storage.get(STATE_KEY).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["sessions"].as_array().unwrap().len(), 1);
        assert!(json.get("undoState").is_none());

        storage.set_fail_writes(true);
        store.end_session();
        assert!(store.current_session().is_none());
        let stale: serde_json::Value =
            serde_json::from_str(&storage.get(STATE_KEY).unwrap()).unwrap();
        assert!(!stale["currentSessionId"].is_null());
    }

    #[test]
    fn hydrate_round_trips_through_storage() {
        let storage = MemoryStorage::new();
        let mut store = AxisStore::hydrate(storage.clone());
        store.set_mode(Mode::Home);
        store.add_task("Water plants", TaskPriority::Low, Mode::Home);
        let id = store.start_session(SessionType::Focus, None);

        let reloaded = AxisStore::hydrate(storage);
        assert_eq!(reloaded.mode(), Mode::Home);
        assert_eq!(reloaded.state().tasks.len(), 1);
        assert_eq!(reloaded.current_session().unwrap().id, id);
        assert!(!reloaded.can_undo());
    }

    #[test]
    fn hydrate_closes_orphans_with_the_store_clock() {
        let storage = MemoryStorage::new();
        let raw = r#"{"sessions": [
            {"id": "a", "mode": "work", "type": "focus", "startTime": "2024-01-01T09:00:00Z",
             "intendedMinutes": 50, "source": "manual"},
            {"id": "b", "mode": "work", "type": "focus", "startTime": "2024-01-01T10:00:00Z",
             "intendedMinutes": 50, "source": "manual"}
        ]}"#;
        storage.save(STATE_KEY, raw).unwrap();

        let fixed = at("2024-01-01T10:30:00Z");
        let store = AxisStore::default()
            .with_clock(move || fixed)
            .load_from(storage, STATE_KEY);
        assert_eq!(store.current_session().unwrap().id, "b");
        assert_eq!(store.state().sessions[0].end_time, Some(fixed));
    }

    #[test]
    fn bad_record_does_not_wipe_stored_state() {
        let storage = MemoryStorage::new();
        let raw = r#"{
            "mode": "home",
            "tasks": [{"id": "t1", "title": "Pay rent", "mode": "home",
                       "createdAt": "2024-01-01T08:00:00Z"}],
            "busyBlocks": [{"id": "b1", "startTime": "2024-01-01T09:00:00Z",
                            "endTime": "2024-01-01T10:00:00Z"}]
        }"#;
        storage.save(STATE_KEY, raw).unwrap();

        let mut store = AxisStore::hydrate(storage.clone());
        assert_eq!(store.mode(), Mode::Home);
        assert_eq!(store.state().tasks.len(), 1);
        store.add_task("Water plants", TaskPriority::Low, Mode::Home);

        let stored = storage.get(STATE_KEY).unwrap();
        assert!(stored.contains("Pay rent"));
        assert!(stored.contains("Water plants"));
    }

    #[test]
    fn unreadable_blob_is_backed_up_before_overwrite() {
        let storage = MemoryStorage::new();
        storage.save(STATE_KEY, "{not json").unwrap();

        let mut store = AxisStore::hydrate(storage.clone());
        store.add_task("Fresh start", TaskPriority::Medium, Mode::Work);

        assert_eq!(storage.get("axis_state_v1_unreadable").as_deref(), Some("{not json"));
        assert!(storage.get(STATE_KEY).unwrap().contains("Fresh start"));
    }

    #[test]
    fn failed_backup_leaves_stored_blob_alone() {
        let storage = MemoryStorage::new();
        storage.save(STATE_KEY, "{not json").unwrap();
        storage.set_fail_writes(true);

        let mut store = AxisStore::hydrate(storage.clone());
        storage.set_fail_writes(false);
        store.add_task("Fresh start", TaskPriority::Medium, Mode::Work);

        assert_eq!(storage.get(STATE_KEY).as_deref(), Some("{not json"));
    }

    #[test]
    fn busy_blocks_require_forward_ranges() {
        let mut store = AxisStore::default();
        let err = store.add_busy_block(
            "Backwards",
            at("2024-01-01T11:00:00Z"),
            at("2024-01-01T10:00:00Z"),
        );
        assert!(matches!(err, Err(ValidationError::InvalidTimeRange { .. })));

        let id = store
            .add_busy_block("Sync", at("2024-01-01T10:00:00Z"), at("2024-01-01T10:30:00Z"))
            .unwrap();
        let bad = BusyBlockPatch {
            end_time: Some(at("2024-01-01T09:00:00Z")),
            ..Default::default()
        };
        assert!(store.update_busy_block(&id, bad).is_err());

        let rename = BusyBlockPatch {
            title: Some("Team sync".into()),
            end_time: Some(at("2024-01-01T11:00:00Z")),
            ..Default::default()
        };
        assert!(store.update_busy_block(&id, rename).unwrap());
        assert_eq!(store.state().busy_blocks[0].title, "Team sync");
        assert!(store.delete_busy_block(&id));
        assert!(!store.delete_busy_block(&id));
    }

    #[test]
    fn task_lifecycle() {
        let (mut store, now) = store_with_clock("2024-01-01T09:00:00Z");
        let first = store.add_task("Write report", TaskPriority::High, Mode::Work);
        let second = store.add_task("Call plumber", TaskPriority::Medium, Mode::Home);
        assert_eq!(store.state().tasks[0].id, second);

        assert!(store.delay_task(&first));
        assert!(store.active_tasks(Mode::Work, store.now()).is_empty());
        assert_eq!(store.delayed_tasks(Mode::Work, store.now()).len(), 1);

        now.set(at("2024-01-02T09:00:01Z"));
        assert_eq!(store.active_tasks(Mode::Work, store.now()).len(), 1);

        assert!(store.toggle_task_completion(&first));
        let task = store.state().tasks.iter().find(|t| t.id == first).unwrap();
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(at("2024-01-02T09:00:01Z")));
        store.toggle_task_completion(&first);
        let task = store.state().tasks.iter().find(|t| t.id == first).unwrap();
        assert!(task.completed_at.is_none());

        assert!(store.update_task(
            &second,
            TaskPatch {
                title: Some("Call electrician".into()),
                ..Default::default()
            }
        ));
        assert!(store.delete_task(&second));
        assert!(!store.update_task(&second, TaskPatch::default()));
    }

    #[test]
    fn session_may_reference_task() {
        let mut store = AxisStore::default();
        let task = store.add_task("Deep work", TaskPriority::High, Mode::Work);
        store.start_session(SessionType::Focus, Some(task.clone()));
        store.delete_task(&task);
        assert_eq!(store.current_session().unwrap().task_id.as_deref(), Some(task.as_str()));
    }

    #[test]
    fn shifts_open_and_close_once() {
        let mut store = AxisStore::default();
        assert!(store.clock_in().is_some());
        assert!(store.clock_in().is_none());
        assert!(store.clock_out());
        assert!(!store.clock_out());
        assert!(store.state().shifts[0].end_time.is_some());
    }

    #[test]
    fn notes_and_brain_dump_items() {
        let mut store = AxisStore::default();
        store.update_notes(
            "2024-01-01",
            Mode::Work,
            NotesPatch {
                meeting_notes: Some("1:1 with Sam".into()),
                ..Default::default()
            },
        );
        let first = store.add_brain_dump_item("2024-01-01", Mode::Work, "buy milk");
        store.add_brain_dump_item("2024-01-01", Mode::Work, "renew passport");
        store.set_doodle("2024-01-01", Mode::Work, Some("data:image/png;base64,AA".into()));

        let notes = store.notes("2024-01-01", Mode::Work);
        assert_eq!(notes.meeting_notes, "1:1 with Sam");
        assert_eq!(notes.brain_dump_items[0].text, "renew passport");
        assert!(notes.doodle_data_url.is_some());
        assert!(store.notes("2024-01-01", Mode::Home).brain_dump_items.is_empty());

        assert!(store.delete_brain_dump_item("2024-01-01", Mode::Work, &first));
        assert_eq!(store.notes("2024-01-01", Mode::Work).brain_dump_items.len(), 1);
    }

    #[test]
    fn board_items_are_per_mode() {
        let mut store = AxisStore::default();
        let item = BoardItem {
            id: "card".into(),
            kind: crate::models::BoardItemKind::Note,
            text: Some("ideas".into()),
            image_data_url: None,
            color: crate::models::BoardColor::Blue,
            x: 0.0,
            y: 0.0,
            width: 240.0,
            height: 160.0,
            z_index: 1,
            created_at: store.now(),
        };
        store.add_board_item(Mode::Home, item);
        assert!(store.board(Mode::Work).items.is_empty());
        assert!(store.update_board_item(
            Mode::Home,
            "card",
            BoardItemPatch {
                x: Some(48.0),
                ..Default::default()
            }
        ));
        assert_eq!(store.board(Mode::Home).items[0].x, 48.0);

        store.set_board_grid(Mode::Home, Some(true), Some(32));
        store.set_board_camera(Mode::Home, Camera { x: 5.0, y: 5.0, zoom: 2.0 });
        assert!(store.board(Mode::Home).snap_to_grid);
        assert_eq!(store.board(Mode::Home).grid_size, 32);
        assert!(store.delete_board_item(Mode::Home, "card"));
    }

    #[test]
    fn work_schedule_is_validated() {
        let mut store = AxisStore::default();
        assert!(store
            .set_work_schedule(vec![WorkSchedule::new(1, "10:00", "09:00")])
            .is_err());
        assert_eq!(store.state().work_schedule.len(), 5);
        store
            .set_work_schedule(vec![WorkSchedule::new(6, "10:00", "14:00")])
            .unwrap();
        assert_eq!(store.state().work_schedule.len(), 1);
    }

    #[test]
    fn seeded_undo_state_survives_a_new_store() {
        let (mut first, _) = store_with_clock("2024-01-01T09:00:00Z");
        let break_id = first.start_session(SessionType::ShortBreak, None);
        first.start_session(SessionType::Focus, None);
        let snapshot = first.state().undo_state.clone();

        let mut second = AxisStore::new(first.state().clone()).with_undo_state(snapshot);
        assert!(second.undo_last_action());
        assert_eq!(second.state().current_session_id.as_deref(), Some(break_id.as_str()));
    }

    #[test]
    fn inconsistent_undo_state_is_dropped() {
        let (mut store, _) = store_with_clock("2024-01-01T09:00:00Z");
        store.start_session(SessionType::Focus, None);
        let snapshot = UndoSnapshot {
            sessions: store.state().sessions.clone(),
            current_session_id: None,
        };
        let store = AxisStore::default().with_undo_state(Some(snapshot));
        assert!(!store.can_undo());
    }
}
